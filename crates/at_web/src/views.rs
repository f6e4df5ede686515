use at_core::{ArticleDetail, ArticleOverview};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionView {
    pub article_detail_id: i64,
}

/// Listing entry: the article plus the ids of its stored versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleView {
    pub id: i64,
    pub topline: String,
    pub headline: String,
    pub is_updated: bool,
    pub article_url: String,
    pub versions: Vec<VersionView>,
}

impl From<&ArticleOverview> for ArticleView {
    fn from(overview: &ArticleOverview) -> Self {
        Self {
            id: overview.article.id,
            topline: overview.article.topline.clone(),
            headline: overview.article.headline.clone(),
            is_updated: overview.is_updated(),
            article_url: overview.article.article_url.clone(),
            versions: overview
                .detail_ids
                .iter()
                .map(|&article_detail_id| VersionView { article_detail_id })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleDetailView {
    pub article_detail_id: i64,
    pub article_id: i64,
    pub topline: String,
    pub headline: String,
    /// ISO-8601 in Europe/Berlin
    #[serde(rename = "Dated")]
    pub dated: Option<String>,
    pub text: String,
}

impl From<&ArticleDetail> for ArticleDetailView {
    fn from(detail: &ArticleDetail) -> Self {
        Self {
            article_detail_id: detail.id,
            article_id: detail.article_id,
            topline: detail.topline.clone(),
            headline: detail.headline.clone(),
            dated: detail.published_at().map(|at| at.to_rfc3339()),
            text: detail.text.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntervalView {
    pub current_interval: u64,
    pub unit: &'static str,
}

impl IntervalView {
    pub fn minutes(current_interval: u64) -> Self {
        Self {
            current_interval,
            unit: "minutes",
        }
    }
}

/// `{status, message}` envelope of the control endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageView {
    pub status: &'static str,
    pub message: String,
}

impl MessageView {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success",
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            message: message.into(),
        }
    }
}
