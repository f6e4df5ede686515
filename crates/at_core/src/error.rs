use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Fetch error: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Article not found: {0}")]
    ArticleNotFound(String),

    #[error("Interval must be a positive number of minutes, got {0}")]
    InvalidInterval(i64),

    #[error("Scheduler error: {0}")]
    Scheduler(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl Error {
    /// True for conditions the caller can correct by changing the request.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::ArticleNotFound(_) | Error::InvalidInterval(_) | Error::InvalidUrl(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
