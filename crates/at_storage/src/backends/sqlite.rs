use async_trait::async_trait;
use at_core::{
    Article, ArticleDetail, ArticleOverview, ArticleStorage, Error, NewArticle, NewArticleDetail,
    Result,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS articles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        topline TEXT NOT NULL,
        headline TEXT NOT NULL,
        short_text TEXT NOT NULL,
        article_url TEXT NOT NULL UNIQUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS article_details (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        article_id INTEGER NOT NULL REFERENCES articles(id),
        topline TEXT NOT NULL,
        headline TEXT NOT NULL,
        text TEXT NOT NULL,
        timestamp INTEGER NOT NULL,
        UNIQUE (article_id, timestamp)
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_article_details_article_id
        ON article_details (article_id)
    "#,
    // Add future migrations here
];

pub struct SQLiteStorage {
    pool: Arc<SqlitePool>,
    db_path: PathBuf,
}

impl SQLiteStorage {
    pub async fn new_with_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| Error::Database(format!("Failed to connect to database: {}", e)))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| {
                    Error::Database(format!("Failed to run migration {}: {}", i, e))
                })?;
        }

        Ok(Self {
            pool: Arc::new(pool),
            db_path: db_path.to_path_buf(),
        })
    }

    pub fn get_db_path(&self) -> &PathBuf {
        &self.db_path
    }
}

fn db_error(context: &str) -> impl FnOnce(sqlx::Error) -> Error + '_ {
    move |e| Error::Database(format!("{}: {}", context, e))
}

fn column<'r, T>(row: &'r SqliteRow, name: &str) -> Result<T>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(name)
        .map_err(|e| Error::Database(format!("Failed to read column {}: {}", name, e)))
}

fn article_from_row(row: &SqliteRow) -> Result<Article> {
    Ok(Article {
        id: column(row, "id")?,
        topline: column(row, "topline")?,
        headline: column(row, "headline")?,
        short_text: column(row, "short_text")?,
        article_url: column(row, "article_url")?,
    })
}

fn detail_from_row(row: &SqliteRow) -> Result<ArticleDetail> {
    Ok(ArticleDetail {
        id: column(row, "id")?,
        article_id: column(row, "article_id")?,
        topline: column(row, "topline")?,
        headline: column(row, "headline")?,
        text: column(row, "text")?,
        timestamp: column(row, "timestamp")?,
    })
}

/// Escape LIKE wildcards so the keyword is matched literally.
fn like_pattern(keyword: &str) -> String {
    let escaped = keyword
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[async_trait]
impl ArticleStorage for SQLiteStorage {
    async fn find_article_by_url(&self, article_url: &str) -> Result<Option<Article>> {
        let row = sqlx::query(
            "SELECT id, topline, headline, short_text, article_url FROM articles WHERE article_url = ?",
        )
        .bind(article_url)
        .fetch_optional(&*self.pool)
        .await
        .map_err(db_error("Failed to find article"))?;

        row.as_ref().map(article_from_row).transpose()
    }

    async fn get_or_create_article(&self, article: NewArticle) -> Result<Article> {
        // Upsert keyed on the unique URL; a concurrent insert of the same URL is a no-op.
        let inserted = sqlx::query(
            r#"
            INSERT INTO articles (topline, headline, short_text, article_url)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (article_url) DO NOTHING
            "#,
        )
        .bind(&article.topline)
        .bind(&article.headline)
        .bind(&article.short_text)
        .bind(&article.article_url)
        .execute(&*self.pool)
        .await
        .map_err(db_error("Failed to store article"))?
        .rows_affected();

        debug!(url = %article.article_url, inserted, "article upsert");

        self.find_article_by_url(&article.article_url)
            .await?
            .ok_or_else(|| {
                Error::Database(format!(
                    "Article vanished after upsert: {}",
                    article.article_url
                ))
            })
    }

    async fn get_or_create_article_detail(
        &self,
        detail: NewArticleDetail,
    ) -> Result<ArticleDetail> {
        sqlx::query(
            r#"
            INSERT INTO article_details (article_id, topline, headline, text, timestamp)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (article_id, timestamp) DO NOTHING
            "#,
        )
        .bind(detail.article_id)
        .bind(&detail.topline)
        .bind(&detail.headline)
        .bind(&detail.text)
        .bind(detail.timestamp)
        .execute(&*self.pool)
        .await
        .map_err(db_error("Failed to store article detail"))?;

        let row = sqlx::query(
            r#"
            SELECT id, article_id, topline, headline, text, timestamp
            FROM article_details
            WHERE article_id = ? AND timestamp = ?
            "#,
        )
        .bind(detail.article_id)
        .bind(detail.timestamp)
        .fetch_one(&*self.pool)
        .await
        .map_err(db_error("Failed to reload article detail"))?;

        detail_from_row(&row)
    }

    async fn list_articles(&self) -> Result<Vec<ArticleOverview>> {
        let article_rows = sqlx::query(
            "SELECT id, topline, headline, short_text, article_url FROM articles ORDER BY id",
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(db_error("Failed to list articles"))?;

        let detail_rows = sqlx::query("SELECT id, article_id FROM article_details ORDER BY id")
            .fetch_all(&*self.pool)
            .await
            .map_err(db_error("Failed to list article details"))?;

        let mut versions: BTreeMap<i64, Vec<i64>> = BTreeMap::new();
        for row in &detail_rows {
            let id: i64 = column(row, "id")?;
            let article_id: i64 = column(row, "article_id")?;
            versions.entry(article_id).or_default().push(id);
        }

        article_rows
            .iter()
            .map(|row| {
                let article = article_from_row(row)?;
                let detail_ids = versions.remove(&article.id).unwrap_or_default();
                Ok(ArticleOverview { article, detail_ids })
            })
            .collect()
    }

    async fn get_article_detail(&self, article_detail_id: i64) -> Result<Option<ArticleDetail>> {
        let row = sqlx::query(
            "SELECT id, article_id, topline, headline, text, timestamp FROM article_details WHERE id = ?",
        )
        .bind(article_detail_id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(db_error("Failed to get article detail"))?;

        row.as_ref().map(detail_from_row).transpose()
    }

    async fn search_article_details(&self, keyword: &str) -> Result<Vec<ArticleDetail>> {
        let pattern = like_pattern(keyword);
        let rows = sqlx::query(
            r#"
            SELECT id, article_id, topline, headline, text, timestamp
            FROM article_details
            WHERE id IN (
                SELECT MAX(id) FROM article_details
                WHERE topline LIKE ? ESCAPE '\'
                   OR headline LIKE ? ESCAPE '\'
                   OR text LIKE ? ESCAPE '\'
                GROUP BY article_id
            )
            ORDER BY article_id
            "#,
        )
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .fetch_all(&*self.pool)
        .await
        .map_err(db_error("Failed to search article details"))?;

        rows.iter().map(detail_from_row).collect()
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&*self.pool)
            .await
            .map_err(db_error("Database connection error"))?;
        Ok(())
    }
}
