use at_core::{ArticleStorage, Error, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub mod backends;

pub use backends::*;

pub const DEFAULT_DB_PATH: &str = "articles.db";

/// Build the storage backend named by `kind` (`memory` or `sqlite`).
///
/// SQLite falls back to `./articles.db` without an explicit path.
pub async fn create_storage(
    kind: &str,
    db_path: Option<&Path>,
) -> Result<Arc<dyn ArticleStorage>> {
    match kind {
        "memory" => {
            info!("🧠 Using in-memory storage");
            Ok(Arc::new(InMemoryStorage::new()))
        }
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            let path = db_path.unwrap_or_else(|| Path::new(DEFAULT_DB_PATH));
            let storage = SQLiteStorage::new_with_path(path).await?;
            info!(path = %storage.get_db_path().display(), "🏦 Using SQLite storage");
            Ok(Arc::new(storage))
        }
        other => {
            let _ = db_path;
            Err(Error::Storage(format!("Unsupported storage backend: {}", other)))
        }
    }
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::create_storage;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_memory_storage() {
        let storage = create_storage("memory", None).await.unwrap();
        storage.ping().await.unwrap();
        assert!(storage.list_articles().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_unknown_storage() {
        let result = create_storage("qdrant", None).await;
        assert!(matches!(result, Err(Error::Storage(_))));
    }

    #[cfg(feature = "sqlite")]
    #[tokio::test]
    async fn test_create_sqlite_storage_at_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("articles.db");
        let storage = create_storage("sqlite", Some(path.as_path())).await.unwrap();
        storage.ping().await.unwrap();
        assert!(path.exists());
    }
}
