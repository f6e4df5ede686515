use std::time::Duration;

/// Everything the pipeline knows about the one site it crawls.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Overview page listing the teasers
    pub overview_url: String,
    /// Resolved teaser links must start with this to count as news
    pub article_prefix: String,
    /// Teaser labels that mark non-article content
    pub excluded_labels: Vec<String>,
    /// Toplines of boilerplate sections that are never crawled
    pub excluded_toplines: Vec<String>,
    pub fetch_timeout: Duration,
    pub user_agent: String,
}

impl SiteConfig {
    pub const TAGESSCHAU_URL: &'static str = "https://www.tagesschau.de/";

    pub fn with_overview_url(mut self, url: impl Into<String>) -> Self {
        self.overview_url = url.into();
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn is_excluded_label(&self, label: &str) -> bool {
        self.excluded_labels.iter().any(|l| l == label)
    }

    pub fn is_excluded_topline(&self, topline: &str) -> bool {
        self.excluded_toplines.iter().any(|t| t == topline)
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            overview_url: Self::TAGESSCHAU_URL.to_string(),
            article_prefix: Self::TAGESSCHAU_URL.to_string(),
            excluded_labels: vec!["Bilder".to_string()],
            excluded_toplines: vec![
                "Spenden".to_string(),
                "Wettervorhersage Deutschland".to_string(),
                "lotto".to_string(),
            ],
            fetch_timeout: Duration::from_secs(30),
            user_agent: format!("article-tracker/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}
