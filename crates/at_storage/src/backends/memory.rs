use async_trait::async_trait;
use at_core::{
    Article, ArticleDetail, ArticleOverview, ArticleStorage, NewArticle, NewArticleDetail, Result,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryStore {
    articles: Vec<Article>,
    details: Vec<ArticleDetail>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find_article_by_url(&self, article_url: &str) -> Option<Article> {
        self.articles.iter().find(|a| a.article_url == article_url).cloned()
    }

    pub fn get_or_create_article(&mut self, new: NewArticle) -> Article {
        if let Some(existing) = self.find_article_by_url(&new.article_url) {
            return existing;
        }
        let article = Article {
            id: self.articles.len() as i64 + 1,
            topline: new.topline,
            headline: new.headline,
            short_text: new.short_text,
            article_url: new.article_url,
        };
        self.articles.push(article.clone());
        article
    }

    pub fn get_or_create_article_detail(&mut self, new: NewArticleDetail) -> ArticleDetail {
        if let Some(existing) = self
            .details
            .iter()
            .find(|d| d.article_id == new.article_id && d.timestamp == new.timestamp)
        {
            return existing.clone();
        }
        let detail = ArticleDetail {
            id: self.details.len() as i64 + 1,
            article_id: new.article_id,
            topline: new.topline,
            headline: new.headline,
            text: new.text,
            timestamp: new.timestamp,
        };
        self.details.push(detail.clone());
        detail
    }

    pub fn list_articles(&self) -> Vec<ArticleOverview> {
        self.articles
            .iter()
            .map(|article| ArticleOverview {
                article: article.clone(),
                detail_ids: self
                    .details
                    .iter()
                    .filter(|d| d.article_id == article.id)
                    .map(|d| d.id)
                    .collect(),
            })
            .collect()
    }

    pub fn get_article_detail(&self, article_detail_id: i64) -> Option<ArticleDetail> {
        self.details.iter().find(|d| d.id == article_detail_id).cloned()
    }

    pub fn search_article_details(&self, keyword: &str) -> Vec<ArticleDetail> {
        let keyword = keyword.to_lowercase();
        let mut latest: BTreeMap<i64, &ArticleDetail> = BTreeMap::new();
        for detail in self.details.iter().filter(|d| {
            d.topline.to_lowercase().contains(&keyword)
                || d.headline.to_lowercase().contains(&keyword)
                || d.text.to_lowercase().contains(&keyword)
        }) {
            // Ids are handed out in insertion order, so a later hit is a newer version.
            latest.insert(detail.article_id, detail);
        }
        latest.into_values().cloned().collect()
    }
}

/// Process-local store; every get-or-create runs under one write lock, so
/// concurrent crawls cannot create duplicates.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    store: Arc<RwLock<MemoryStore>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArticleStorage for InMemoryStorage {
    async fn find_article_by_url(&self, article_url: &str) -> Result<Option<Article>> {
        let store = self.store.read().await;
        Ok(store.find_article_by_url(article_url))
    }

    async fn get_or_create_article(&self, article: NewArticle) -> Result<Article> {
        let mut store = self.store.write().await;
        Ok(store.get_or_create_article(article))
    }

    async fn get_or_create_article_detail(
        &self,
        detail: NewArticleDetail,
    ) -> Result<ArticleDetail> {
        let mut store = self.store.write().await;
        Ok(store.get_or_create_article_detail(detail))
    }

    async fn list_articles(&self) -> Result<Vec<ArticleOverview>> {
        let store = self.store.read().await;
        Ok(store.list_articles())
    }

    async fn get_article_detail(&self, article_detail_id: i64) -> Result<Option<ArticleDetail>> {
        let store = self.store.read().await;
        Ok(store.get_article_detail(article_detail_id))
    }

    async fn search_article_details(&self, keyword: &str) -> Result<Vec<ArticleDetail>> {
        let store = self.store.read().await;
        Ok(store.search_article_details(keyword))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
