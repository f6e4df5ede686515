use at_core::{Error, Result, SITE_TIMEZONE};
use chrono::{LocalResult, NaiveDateTime, TimeZone};

const STAND_FORMAT: &str = "%d.%m.%Y %H:%M";

/// Parse a "Stand: dd.mm.yyyy hh:mm Uhr" line into epoch seconds.
///
/// The civil time is read in the site's timezone. During the autumn
/// fall-back hour the earlier instant wins; a time inside the spring gap does
/// not exist and is rejected.
pub fn parse_stand_timestamp(date_line: &str) -> Result<i64> {
    let trimmed = date_line.trim();
    let trimmed = trimmed.strip_prefix("Stand:").unwrap_or(trimmed);
    let trimmed = trimmed.trim();
    let trimmed = trimmed.strip_suffix("Uhr").unwrap_or(trimmed).trim();

    let naive = NaiveDateTime::parse_from_str(trimmed, STAND_FORMAT)
        .map_err(|e| Error::Parse(format!("Unreadable date line {:?}: {}", date_line, e)))?;

    match SITE_TIMEZONE.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt.timestamp()),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.timestamp()),
        LocalResult::None => Err(Error::Parse(format!(
            "Date line {:?} names a time that does not exist in {}",
            date_line, SITE_TIMEZONE
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_summer_time() {
        assert_eq!(
            parse_stand_timestamp("Stand: 04.04.2025 16:10 Uhr").unwrap(),
            1743775800
        );
    }

    #[test]
    fn test_parse_winter_time() {
        // 15.01.2025 08:00 CET == 07:00 UTC
        assert_eq!(
            parse_stand_timestamp("Stand: 15.01.2025 08:00 Uhr").unwrap(),
            1736924400
        );
    }

    #[test]
    fn test_parse_tolerates_whitespace() {
        assert_eq!(
            parse_stand_timestamp("  Stand:  04.04.2025 16:10  Uhr ").unwrap(),
            1743775800
        );
    }

    #[test]
    fn test_ambiguous_picks_earlier() {
        // 26.10.2025 02:30 happens twice; CEST (+02:00) comes first.
        let ts = parse_stand_timestamp("Stand: 26.10.2025 02:30 Uhr").unwrap();
        assert_eq!(ts, 1761438600);
    }

    #[test]
    fn test_gap_is_rejected() {
        let result = parse_stand_timestamp("Stand: 30.03.2025 02:30 Uhr");
        assert!(matches!(result, Err(Error::Parse(_))));
    }

    #[test]
    fn test_malformed() {
        for line in [
            "",
            "Stand: gestern",
            "Stand: 32.01.2025 10:00 Uhr",
            "04/04/2025 16:10",
        ] {
            assert!(
                matches!(parse_stand_timestamp(line), Err(Error::Parse(_))),
                "{}",
                line
            );
        }
    }
}
