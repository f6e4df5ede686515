use crate::config::SiteConfig;
use crate::extractor::{ArticleExtractor, TagesschauExtractor};
use crate::fetcher::{HttpFetcher, PageFetcher};
use crate::timestamp::parse_stand_timestamp;
use crate::validation::{validate_teaser, ValidTeaser};
use async_trait::async_trait;
use at_core::{
    ArticleDetail, ArticleStorage, CrawlJob, Error, NewArticle, NewArticleDetail, Result,
};
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Counts from one full crawl, for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlReport {
    pub teasers: usize,
    pub skipped: usize,
    pub failed: usize,
    pub crawled: usize,
}

impl fmt::Display for CrawlReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} teasers, {} crawled, {} skipped, {} failed",
            self.teasers, self.crawled, self.skipped, self.failed
        )
    }
}

/// Fetch → extract → store, for the overview page and for single articles.
pub struct CrawlPipeline {
    storage: Arc<dyn ArticleStorage>,
    fetcher: Arc<dyn PageFetcher>,
    extractor: Arc<dyn ArticleExtractor>,
    config: SiteConfig,
}

impl CrawlPipeline {
    pub fn new(
        storage: Arc<dyn ArticleStorage>,
        fetcher: Arc<dyn PageFetcher>,
        extractor: Arc<dyn ArticleExtractor>,
        config: SiteConfig,
    ) -> Self {
        Self {
            storage,
            fetcher,
            extractor,
            config,
        }
    }

    /// Pipeline wired to the real site: HTTP fetcher and tagesschau selectors.
    pub fn for_site(storage: Arc<dyn ArticleStorage>, config: SiteConfig) -> Result<Self> {
        let fetcher = HttpFetcher::new(config.fetch_timeout, &config.user_agent)?;
        let extractor = TagesschauExtractor::new()?;
        Ok(Self::new(storage, Arc::new(fetcher), Arc::new(extractor), config))
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// Crawl every valid teaser on the overview page.
    ///
    /// Only a failure to load the overview page fails the run; anything going
    /// wrong for a single teaser is logged and counted.
    pub async fn run_full_crawl(&self) -> Result<CrawlReport> {
        let overview_url = &self.config.overview_url;
        info!("🕷️ Starting full crawl of {}", overview_url);

        let markup = self.fetcher.fetch(overview_url).await?;
        let teasers = self.extractor.extract_teasers(&markup, overview_url)?;

        let mut report = CrawlReport {
            teasers: teasers.len(),
            ..Default::default()
        };
        info!(count = teasers.len(), "📋 Found teasers on overview page");

        for teaser in &teasers {
            let valid = match validate_teaser(teaser, &self.config) {
                Ok(valid) => valid,
                Err(reason) => {
                    info!(
                        link = teaser.link.as_deref().unwrap_or("-"),
                        "⏭️ Skipping teaser: {}", reason
                    );
                    report.skipped += 1;
                    continue;
                }
            };

            let url = valid.url.clone();
            match self.crawl_teaser(valid).await {
                Ok(detail) => {
                    info!(
                        article_id = detail.article_id,
                        article_detail_id = detail.id,
                        "✅ Crawled {}", url
                    );
                    report.crawled += 1;
                }
                Err(e) => {
                    error!("❌ Failed to crawl {}: {}", url, e);
                    report.failed += 1;
                }
            }
        }

        info!("🏁 Full crawl finished: {}", report);
        Ok(report)
    }

    async fn crawl_teaser(&self, teaser: ValidTeaser) -> Result<ArticleDetail> {
        let article = self
            .storage
            .get_or_create_article(NewArticle {
                topline: teaser.topline,
                headline: teaser.headline,
                short_text: teaser.short_text,
                article_url: teaser.url,
            })
            .await?;

        self.run_single_article_crawl(article.id, &article.article_url)
            .await
    }

    /// Fetch one detail page and store it as a version of `article_id`.
    pub async fn run_single_article_crawl(
        &self,
        article_id: i64,
        article_url: &str,
    ) -> Result<ArticleDetail> {
        let markup = self.fetcher.fetch(article_url).await?;
        let fields = self.extractor.extract_detail(&markup)?;

        let date_line = fields
            .date_line
            .ok_or_else(|| Error::Parse(format!("No date line on {}", article_url)))?;
        let timestamp = parse_stand_timestamp(&date_line)?;
        let topline = fields
            .topline
            .ok_or_else(|| Error::Parse(format!("No topline on {}", article_url)))?;
        let headline = fields
            .headline
            .ok_or_else(|| Error::Parse(format!("No headline on {}", article_url)))?;

        self.storage
            .get_or_create_article_detail(NewArticleDetail {
                article_id,
                topline,
                headline,
                text: fields.paragraphs.join("\n"),
                timestamp,
            })
            .await
    }

    /// Re-crawl an article that is already stored, looked up by its URL.
    pub async fn crawl_known_article(&self, article_url: &str) -> Result<ArticleDetail> {
        let article = self
            .storage
            .find_article_by_url(article_url)
            .await?
            .ok_or_else(|| {
                warn!("🔎 No stored article for {}", article_url);
                Error::ArticleNotFound(article_url.to_string())
            })?;

        info!(article_id = article.id, "🕷️ Crawling single article {}", article_url);
        self.run_single_article_crawl(article.id, &article.article_url)
            .await
    }
}

#[async_trait]
impl CrawlJob for CrawlPipeline {
    fn name(&self) -> &str {
        "full crawl"
    }

    async fn run(&self) {
        if let Err(e) = self.run_full_crawl().await {
            error!("❌ Full crawl failed: {}", e);
        }
    }
}
