use at_core::{ArticleDetail, ArticleOverview, ArticleStorage, Error, Result};
use at_crawler::CrawlPipeline;
use at_scheduler::{CrawlerScheduler, SchedulerStatus};
use std::sync::Arc;
use tracing::info;

/// Translates control and explorer requests into scheduler, pipeline and
/// store calls.
pub struct ArticleService {
    storage: Arc<dyn ArticleStorage>,
    pipeline: Arc<CrawlPipeline>,
    scheduler: Arc<CrawlerScheduler>,
}

impl ArticleService {
    pub fn new(
        storage: Arc<dyn ArticleStorage>,
        pipeline: Arc<CrawlPipeline>,
        scheduler: Arc<CrawlerScheduler>,
    ) -> Self {
        Self {
            storage,
            pipeline,
            scheduler,
        }
    }

    pub fn scheduler(&self) -> &Arc<CrawlerScheduler> {
        &self.scheduler
    }

    /// Queue an immediate full crawl on the scheduler's worker.
    pub fn trigger_full_crawl_now(&self) -> bool {
        self.scheduler.trigger_now()
    }

    /// Re-crawl a stored article in the caller's task.
    pub async fn trigger_single_article_crawl(&self, article_url: &str) -> Result<ArticleDetail> {
        self.pipeline.crawl_known_article(article_url).await
    }

    pub fn get_current_scheduler_interval(&self) -> u64 {
        self.scheduler.interval()
    }

    pub fn change_scheduler_interval(&self, minutes: i64) -> Result<bool> {
        if minutes < 1 {
            return Err(Error::InvalidInterval(minutes));
        }
        self.scheduler.update_interval(minutes)
    }

    pub fn get_scheduler_status(&self) -> SchedulerStatus {
        self.scheduler.status()
    }

    pub fn enable_scheduler(&self) -> bool {
        self.scheduler.enable()
    }

    pub fn disable_scheduler(&self) -> bool {
        self.scheduler.disable()
    }

    pub async fn retrieve_all_articles(&self) -> Result<Vec<ArticleOverview>> {
        self.storage.list_articles().await
    }

    pub async fn retrieve_article_detail(
        &self,
        article_detail_id: i64,
    ) -> Result<Option<ArticleDetail>> {
        self.storage.get_article_detail(article_detail_id).await
    }

    pub async fn search_articles_by_keyword(&self, keyword: &str) -> Result<Vec<ArticleDetail>> {
        info!(keyword, "🔍 Searching article details");
        self.storage.search_article_details(keyword).await
    }

    pub async fn health(&self) -> Result<()> {
        self.storage.ping().await
    }
}
