use async_trait::async_trait;
use crate::models::{Article, ArticleDetail, ArticleOverview, NewArticle, NewArticleDetail};
use crate::Result;

#[async_trait]
pub trait ArticleStorage: Send + Sync {
    /// Look up an article by its source URL
    async fn find_article_by_url(&self, article_url: &str) -> Result<Option<Article>>;

    /// Return the article stored under `article.article_url`, creating it if absent.
    /// The returned row always carries its store-assigned id.
    async fn get_or_create_article(&self, article: NewArticle) -> Result<Article>;

    /// Return the detail stored under `(article_id, timestamp)`, creating it if absent.
    async fn get_or_create_article_detail(&self, detail: NewArticleDetail) -> Result<ArticleDetail>;

    /// All articles with the ids of their stored versions
    async fn list_articles(&self) -> Result<Vec<ArticleOverview>>;

    async fn get_article_detail(&self, article_detail_id: i64) -> Result<Option<ArticleDetail>>;

    /// Latest matching version per article whose topline, headline or text
    /// contains `keyword` (case-insensitive).
    async fn search_article_details(&self, keyword: &str) -> Result<Vec<ArticleDetail>>;

    /// Cheap round trip to the backing store
    async fn ping(&self) -> Result<()>;
}
