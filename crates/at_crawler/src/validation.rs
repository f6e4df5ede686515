use crate::config::SiteConfig;
use crate::extractor::TeaserFields;
use thiserror::Error;

/// Why a teaser was left out of a crawl. Not a failure: the pipeline logs it
/// and moves on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    #[error("missing one of topline, headline, short text or link")]
    MissingFields,

    #[error("link does not point to an article: {0}")]
    ForeignLink(String),

    #[error("picture gallery")]
    PicturesOnly,

    #[error("excluded section: {0}")]
    ExcludedTopline(String),
}

/// A teaser that passed every rule; all fields are present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidTeaser {
    pub topline: String,
    pub headline: String,
    pub short_text: String,
    pub url: String,
}

pub fn validate_teaser(
    teaser: &TeaserFields,
    config: &SiteConfig,
) -> std::result::Result<ValidTeaser, SkipReason> {
    let (Some(topline), Some(headline), Some(short_text), Some(url)) = (
        teaser.topline.as_ref(),
        teaser.headline.as_ref(),
        teaser.short_text.as_ref(),
        teaser.link.as_ref(),
    ) else {
        return Err(SkipReason::MissingFields);
    };

    if !url.starts_with(&config.article_prefix) {
        return Err(SkipReason::ForeignLink(url.clone()));
    }
    if teaser
        .label
        .as_deref()
        .is_some_and(|label| config.is_excluded_label(label))
    {
        return Err(SkipReason::PicturesOnly);
    }
    if config.is_excluded_topline(topline) {
        return Err(SkipReason::ExcludedTopline(topline.clone()));
    }

    Ok(ValidTeaser {
        topline: topline.clone(),
        headline: headline.clone(),
        short_text: short_text.clone(),
        url: url.clone(),
    })
}
