//! Recurring crawl scheduling on a dedicated worker thread.
//!
//! [`CrawlerScheduler`] owns the thread and exposes the control surface;
//! [`JobRegistry`] holds the interval jobs the worker loop fires.

pub mod registry;
pub mod scheduler;

pub use registry::JobRegistry;
pub use scheduler::{
    CrawlerScheduler, SchedulerConfig, SchedulerStatus, DEFAULT_INTERVAL_MINUTES, DEFAULT_JOB_ID,
};
