use async_trait::async_trait;

/// Body of a recurring scheduled job.
///
/// Implementations own their failure handling: the scheduler only logs that a
/// run started and finished.
#[async_trait]
pub trait CrawlJob: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self);
}
