use async_trait::async_trait;
use at_core::{Error, Result};
use std::time::Duration;
use tracing::info;

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `url` and return the raw markup of the page
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// `reqwest`-backed fetcher; every request carries the configured timeout.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        reqwest::Url::parse(url).map_err(|e| Error::InvalidUrl(format!("{}: {}", url, e)))?;

        info!("🌐 Fetching URL: {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        info!(status = status.as_u16(), "📥 Fetched URL: {}", url);

        let response = response.error_for_status()?;
        Ok(response.text().await?)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tokio::net::TcpListener;

    /// URL of a local server that accepts connections and never answers.
    pub(crate) async fn stalled_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        format!("http://{}/inland/stalled-100.html", addr)
    }

    #[tokio::test]
    async fn test_fetch_rejects_relative_url() {
        let fetcher = HttpFetcher::new(Duration::from_secs(1), "test").unwrap();
        let result = fetcher.fetch("").await;
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_fetch_timeout_is_fetch_error() {
        let url = stalled_server().await;
        let fetcher = HttpFetcher::new(Duration::from_millis(100), "test").unwrap();

        let started = std::time::Instant::now();
        match fetcher.fetch(&url).await {
            Err(Error::Fetch(e)) => assert!(e.is_timeout()),
            other => panic!("expected a fetch timeout, got {:?}", other.map(|_| ())),
        }
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
