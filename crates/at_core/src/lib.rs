pub mod error;
pub mod job;
pub mod models;
pub mod storage;

pub use error::Error;
pub use job::CrawlJob;
pub use models::{
    Article, ArticleDetail, ArticleOverview, NewArticle, NewArticleDetail, SITE_TIMEZONE,
};
pub use storage::ArticleStorage;

pub type Result<T> = std::result::Result<T, Error>;
