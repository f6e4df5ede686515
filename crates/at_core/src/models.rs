use chrono::{DateTime, TimeZone};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Civil timezone the site publishes its "Stand:" lines in.
pub const SITE_TIMEZONE: Tz = chrono_tz::Europe::Berlin;

/// Top-level record, one per distinct source URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub topline: String,
    pub headline: String,
    pub short_text: String,
    pub article_url: String,
}

/// A timestamped full-content snapshot belonging to an [`Article`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleDetail {
    pub id: i64,
    pub article_id: i64,
    pub topline: String,
    pub headline: String,
    pub text: String,
    /// Epoch seconds.
    pub timestamp: i64,
}

impl ArticleDetail {
    /// The publish instant rendered in the site's civil timezone.
    pub fn published_at(&self) -> Option<DateTime<Tz>> {
        SITE_TIMEZONE.timestamp_opt(self.timestamp, 0).single()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewArticle {
    pub topline: String,
    pub headline: String,
    pub short_text: String,
    pub article_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewArticleDetail {
    pub article_id: i64,
    pub topline: String,
    pub headline: String,
    pub text: String,
    pub timestamp: i64,
}

/// An article together with the ids of every stored version of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleOverview {
    pub article: Article,
    pub detail_ids: Vec<i64>,
}

impl ArticleOverview {
    /// More than one crawl produced a distinct version of this article.
    pub fn is_updated(&self) -> bool {
        self.detail_ids.len() > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overview(detail_ids: Vec<i64>) -> ArticleOverview {
        ArticleOverview {
            article: Article {
                id: 112,
                topline: "Tech Giant".to_string(),
                headline: "Revolutionary Product".to_string(),
                short_text: "A game-changing product.".to_string(),
                article_url: "https://www.tagesschau.de/wirtschaft/product-100.html".to_string(),
            },
            detail_ids,
        }
    }

    #[test]
    fn test_is_updated() {
        assert!(!overview(vec![]).is_updated());
        assert!(!overview(vec![1]).is_updated());
        assert!(overview(vec![1, 2]).is_updated());
    }

    #[test]
    fn test_published_at_in_berlin() {
        let detail = ArticleDetail {
            id: 1,
            article_id: 1,
            topline: "t".to_string(),
            headline: "h".to_string(),
            text: "x".to_string(),
            timestamp: 1743775800,
        };
        let published = detail.published_at().unwrap();
        assert_eq!(published.to_rfc3339(), "2025-04-04T16:10:00+02:00");
    }
}
