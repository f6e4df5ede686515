pub mod config;
pub mod extractor;
pub mod fetcher;
pub mod logging;
pub mod pipeline;
pub mod timestamp;
pub mod validation;

pub use config::SiteConfig;
pub use extractor::{ArticleExtractor, DetailFields, TagesschauExtractor, TeaserFields};
pub use fetcher::{HttpFetcher, PageFetcher};
pub use logging::init_logging;
pub use pipeline::{CrawlPipeline, CrawlReport};
pub use timestamp::parse_stand_timestamp;
pub use validation::{validate_teaser, SkipReason, ValidTeaser};

pub mod prelude {
    pub use super::{ArticleExtractor, CrawlPipeline, PageFetcher, SiteConfig};
    pub use at_core::{Error, Result};
}
