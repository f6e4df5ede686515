use at_core::{ArticleStorage, Error, Result};
use at_crawler::{init_logging, CrawlPipeline, SiteConfig};
use at_scheduler::{CrawlerScheduler, SchedulerConfig, DEFAULT_INTERVAL_MINUTES};
use at_web::{create_app, AppState, ArticleService};
use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HumanDuration(Duration);

impl FromStr for HumanDuration {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut total_seconds = 0u64;
        let mut current_number = String::new();
        let mut has_unit = false;

        for c in s.chars() {
            if c.is_ascii_digit() {
                current_number.push(c);
            } else if !current_number.is_empty() {
                let num = current_number
                    .parse::<u64>()
                    .map_err(|_| "Duration is too large".to_string())?;
                let seconds = match c {
                    's' => Some(num),
                    'm' => num.checked_mul(60),
                    'h' => num.checked_mul(3600),
                    _ => return Err(format!("Invalid duration unit: {}", c)),
                };
                total_seconds = seconds
                    .and_then(|secs| total_seconds.checked_add(secs))
                    .ok_or_else(|| "Duration is too large".to_string())?;
                current_number.clear();
                has_unit = true;
            } else if !c.is_whitespace() {
                return Err(format!("Invalid character in duration: {}", c));
            }
        }

        // A bare number means seconds
        if !current_number.is_empty() {
            let num = current_number
                .parse::<u64>()
                .map_err(|_| "Duration is too large".to_string())?;
            total_seconds = total_seconds
                .checked_add(num)
                .ok_or_else(|| "Duration is too large".to_string())?;
            has_unit = true;
        }

        if !has_unit {
            return Err("Duration must include a number".to_string());
        }
        if total_seconds == 0 {
            return Err("Duration must be greater than zero".to_string());
        }

        Ok(HumanDuration(Duration::from_secs(total_seconds)))
    }
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Tracks tagesschau.de articles and their revisions",
    long_about = None
)]
struct Cli {
    /// Storage backend: memory or sqlite
    #[arg(long, env = "AT_STORAGE", default_value = "sqlite")]
    storage: String,
    #[arg(long, env = "AT_DB_PATH", default_value = at_storage::DEFAULT_DB_PATH)]
    db_path: PathBuf,
    /// Overview page to crawl instead of the tagesschau.de front page
    #[arg(long, env = "AT_OVERVIEW_URL")]
    overview_url: Option<String>,
    /// Per-request timeout (e.g. 30s, 1m, 1m30s)
    #[arg(long, default_value = "30s")]
    fetch_timeout: HumanDuration,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Serve the HTTP API and run the crawl scheduler
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, default_value_t = 5000)]
        port: u16,
        /// Minutes between scheduled crawls
        #[arg(
            long,
            default_value_t = DEFAULT_INTERVAL_MINUTES,
            value_parser = clap::value_parser!(u64).range(1..)
        )]
        interval: u64,
        /// Register the crawl job paused
        #[arg(long)]
        paused: bool,
    },
    /// Crawl the overview page once
    Crawl,
    /// Crawl a new version of an already stored article
    CrawlUrl { url: String },
    /// List stored articles with their version ids
    List,
    /// Latest matching version per article
    Search { keyword: String },
}

impl Cli {
    fn site_config(&self) -> SiteConfig {
        let config = SiteConfig::default().with_fetch_timeout(self.fetch_timeout.0);
        match &self.overview_url {
            Some(url) => config.with_overview_url(url.clone()),
            None => config,
        }
    }
}

async fn check_storage_with_retry(
    storage: &Arc<dyn ArticleStorage>,
    storage_type: &str,
    max_retries: u32,
    timeout: Duration,
) -> Result<()> {
    let mut retries = 0;
    let mut last_error = None;

    while retries < max_retries {
        match tokio::time::timeout(timeout, storage.ping()).await {
            Ok(Ok(())) => {
                info!("🏦 Storage backend initialized successfully (using {})", storage_type);
                return Ok(());
            }
            Ok(Err(e)) => last_error = Some(e),
            Err(elapsed) => {
                last_error = Some(Error::Storage(format!(
                    "Storage health check timed out: {}",
                    elapsed
                )))
            }
        }
        retries += 1;
        if retries < max_retries {
            info!("Storage health check failed, retrying {}/{}...", retries, max_retries);
            tokio::time::sleep(Duration::from_secs(2)).await;
        }
    }

    Err(last_error.unwrap_or_else(|| {
        Error::Storage("Storage health check failed after all retries".to_string())
    }))
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("👋 Received Ctrl-C"),
        Err(e) => error!("❌ Failed to listen for Ctrl-C: {}", e),
    }
}

async fn serve(
    storage: Arc<dyn ArticleStorage>,
    pipeline: Arc<CrawlPipeline>,
    addr: (String, u16),
    config: SchedulerConfig,
) -> Result<()> {
    let scheduler = Arc::new(CrawlerScheduler::new(pipeline.clone(), config));
    scheduler.start()?;

    let service = Arc::new(ArticleService::new(storage, pipeline, scheduler.clone()));
    let app = create_app(AppState { service }).await;

    let listener = tokio::net::TcpListener::bind((addr.0.as_str(), addr.1)).await?;
    info!("🌍 Listening on http://{}", listener.local_addr()?);
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    info!("🛑 Stopping scheduler");
    tokio::task::spawn_blocking(move || scheduler.stop())
        .await
        .map_err(|e| Error::Scheduler(format!("Scheduler shutdown failed: {}", e)))?;

    Ok(served?)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let storage = at_storage::create_storage(&cli.storage, Some(cli.db_path.as_path())).await?;
    check_storage_with_retry(&storage, &cli.storage, 3, Duration::from_secs(10)).await?;

    let pipeline = Arc::new(CrawlPipeline::for_site(storage.clone(), cli.site_config())?);
    info!("🦗 Crawling {}", pipeline.config().overview_url);

    match cli.command {
        Commands::Serve {
            host,
            port,
            interval,
            paused,
        } => {
            let config = SchedulerConfig {
                interval_minutes: interval,
                enabled: !paused,
                ..Default::default()
            };
            serve(storage, pipeline, (host, port), config).await?;
        }
        Commands::Crawl => {
            let report = pipeline.run_full_crawl().await?;
            println!("{}", report);
        }
        Commands::CrawlUrl { url } => {
            let detail = pipeline.crawl_known_article(&url).await?;
            println!(
                "Stored version {} of article {} ({})",
                detail.id, detail.article_id, detail.headline
            );
        }
        Commands::List => {
            for overview in storage.list_articles().await? {
                let versions = overview
                    .detail_ids
                    .iter()
                    .map(i64::to_string)
                    .collect::<Vec<_>>()
                    .join(",");
                println!(
                    "{:>5}  {}{}  [{}]\n       {}",
                    overview.article.id,
                    overview.article.headline,
                    if overview.is_updated() { " (updated)" } else { "" },
                    versions,
                    overview.article.article_url
                );
            }
        }
        Commands::Search { keyword } => {
            let details = storage.search_article_details(&keyword).await?;
            println!("Found {} matching articles", details.len());
            for detail in details {
                let dated = detail
                    .published_at()
                    .map(|at| at.to_rfc3339())
                    .unwrap_or_default();
                println!("{:>5}  {}  {}  {}", detail.id, dated, detail.topline, detail.headline);
            }
        }
    }

    Ok(())
}
