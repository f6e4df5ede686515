use crate::service::ArticleService;
use async_trait::async_trait;
use at_core::{Error, Result};
use at_crawler::{CrawlPipeline, PageFetcher, SiteConfig, TagesschauExtractor};
use at_scheduler::{CrawlerScheduler, SchedulerConfig};
use at_storage::InMemoryStorage;
use std::collections::HashMap;
use std::sync::Arc;

pub const ARTICLE_URL: &str = "https://www.tagesschau.de/inland/haushalt-einigung-100.html";

const OVERVIEW: &str = r#"
    <div class="columns twelve teasergroup">
      <a class="teaser__link" href="/inland/haushalt-einigung-100.html">
        <span class="teaser__topline">Bundeshaushalt</span>
        <span class="teaser__headline">Einigung im Haushaltsstreit</span>
      </a>
      <p class="teaser__shorttext">Die Koalition hat sich geeinigt.</p>
    </div>
"#;

const DETAIL: &str = r#"
    <span class="seitenkopf__topline">Bundeshaushalt</span>
    <span class="seitenkopf__headline--text">Koalition einigt sich auf Haushalt</span>
    <p class="metatextline">Stand: 04.04.2025 16:10 Uhr</p>
    <p class="textabsatz">Nach wochenlangen Verhandlungen.</p>
"#;

/// Serves fixed markup per URL.
pub struct StaticFetcher {
    pages: HashMap<String, String>,
}

#[async_trait]
impl PageFetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| Error::Parse(format!("no page for {}", url)))
    }
}

pub fn service_with_site() -> (Arc<InMemoryStorage>, Arc<ArticleService>) {
    let storage = Arc::new(InMemoryStorage::new());
    let fetcher = StaticFetcher {
        pages: HashMap::from([
            (SiteConfig::TAGESSCHAU_URL.to_string(), OVERVIEW.to_string()),
            (ARTICLE_URL.to_string(), DETAIL.to_string()),
        ]),
    };
    let pipeline = Arc::new(CrawlPipeline::new(
        storage.clone(),
        Arc::new(fetcher),
        Arc::new(TagesschauExtractor::new().unwrap()),
        SiteConfig::default(),
    ));
    let scheduler = Arc::new(CrawlerScheduler::new(
        pipeline.clone(),
        SchedulerConfig::default(),
    ));
    let service = ArticleService::new(storage.clone(), pipeline, scheduler);
    (storage, Arc::new(service))
}
