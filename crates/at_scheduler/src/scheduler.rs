use crate::registry::JobRegistry;
use at_core::{CrawlJob, Error, Result};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub const DEFAULT_JOB_ID: &str = "tagesschau_main_page_crawler";
pub const DEFAULT_INTERVAL_MINUTES: u64 = 60;

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub job_id: String,
    pub interval_minutes: u64,
    /// `false` registers the job paused
    pub enabled: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            job_id: DEFAULT_JOB_ID.to_string(),
            interval_minutes: DEFAULT_INTERVAL_MINUTES,
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SchedulerStatus {
    pub enabled: bool,
    /// Minutes
    pub interval: u64,
    pub running: bool,
}

struct Worker {
    registry: Arc<JobRegistry>,
    shutdown: CancellationToken,
    thread: JoinHandle<()>,
}

impl Worker {
    fn is_alive(&self) -> bool {
        !self.thread.is_finished() && !self.shutdown.is_cancelled()
    }
}

struct Inner {
    worker: Option<Worker>,
    interval_minutes: u64,
    enabled: bool,
    /// Set while `stop` joins the worker; no new worker may start meanwhile
    stopping: bool,
}

fn minutes(n: u64) -> Duration {
    Duration::from_secs(n.saturating_mul(60))
}

/// Runs one recurring crawl job on a dedicated thread with its own runtime.
///
/// All control methods take `&self` and may be called from any thread. None
/// of them waits for a crawl except [`CrawlerScheduler::stop`].
pub struct CrawlerScheduler {
    job_id: String,
    job: Arc<dyn CrawlJob>,
    inner: Mutex<Inner>,
}

impl CrawlerScheduler {
    pub fn new(job: Arc<dyn CrawlJob>, config: SchedulerConfig) -> Self {
        Self {
            job_id: config.job_id,
            job,
            inner: Mutex::new(Inner {
                worker: None,
                interval_minutes: config.interval_minutes.max(1),
                enabled: config.enabled,
                stopping: false,
            }),
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Spawn the worker thread unless one is already running.
    ///
    /// Returns as soon as the thread is launched. The first run happens one
    /// interval later.
    pub fn start(&self) -> Result<()> {
        let mut inner = self.lock();
        self.start_locked(&mut inner)
    }

    fn start_locked(&self, inner: &mut Inner) -> Result<()> {
        if inner.stopping {
            return Err(Error::Scheduler("scheduler is stopping".to_string()));
        }
        if inner.worker.as_ref().is_some_and(Worker::is_alive) {
            debug!(job_id = %self.job_id, "Scheduler already running");
            return Ok(());
        }
        if let Some(stale) = inner.worker.take() {
            stale.shutdown.cancel();
            if stale.thread.join().is_err() {
                error!(job_id = %self.job_id, "💥 Previous scheduler thread panicked");
            }
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let registry = Arc::new(JobRegistry::new());
        registry.add(
            &self.job_id,
            self.job.clone(),
            minutes(inner.interval_minutes),
            !inner.enabled,
        );
        let shutdown = CancellationToken::new();

        let thread = {
            let registry = registry.clone();
            let shutdown = shutdown.clone();
            std::thread::Builder::new()
                .name(format!("scheduler-{}", self.job_id))
                .spawn(move || runtime.block_on(run_worker(registry, shutdown)))?
        };

        inner.worker = Some(Worker {
            registry,
            shutdown,
            thread,
        });
        info!(
            job_id = %self.job_id,
            interval_minutes = inner.interval_minutes,
            enabled = inner.enabled,
            "🚀 Scheduler started"
        );
        Ok(())
    }

    /// Start if needed and hand back the live registry.
    fn started_registry(&self, inner: &mut Inner) -> Option<Arc<JobRegistry>> {
        if let Err(e) = self.start_locked(inner) {
            error!(job_id = %self.job_id, "❌ Failed to start scheduler: {}", e);
            return None;
        }
        inner.worker.as_ref().map(|w| w.registry.clone())
    }

    pub fn is_running(&self) -> bool {
        self.lock().worker.as_ref().is_some_and(Worker::is_alive)
    }

    /// Ask the worker to run the job as soon as it is free. Does not wait for
    /// the run; returns false if the job is not registered.
    pub fn trigger_now(&self) -> bool {
        let mut inner = self.lock();
        let Some(registry) = self.started_registry(&mut inner) else {
            return false;
        };
        if registry.run_now(&self.job_id) {
            info!(job_id = %self.job_id, "⚡ Triggered job to run now");
            true
        } else {
            warn!(job_id = %self.job_id, "⚠️ Job not found, nothing triggered");
            false
        }
    }

    /// Current interval in minutes.
    pub fn interval(&self) -> u64 {
        self.lock().interval_minutes
    }

    /// Replace the interval; the next run is one new interval from now.
    pub fn update_interval(&self, interval_minutes: i64) -> Result<bool> {
        let new_interval = u64::try_from(interval_minutes)
            .ok()
            .filter(|m| *m > 0)
            .ok_or(Error::InvalidInterval(interval_minutes))?;

        let mut inner = self.lock();
        self.start_locked(&mut inner)?;
        let Some(registry) = inner.worker.as_ref().map(|w| w.registry.clone()) else {
            return Err(Error::Scheduler("worker missing after start".to_string()));
        };

        if registry.reschedule(&self.job_id, minutes(new_interval)) {
            inner.interval_minutes = new_interval;
            info!(
                job_id = %self.job_id,
                interval_minutes = new_interval,
                "⏱️ Interval updated"
            );
            Ok(true)
        } else {
            warn!(job_id = %self.job_id, "⚠️ Job not found, interval unchanged");
            Ok(false)
        }
    }

    pub fn enable(&self) -> bool {
        let mut inner = self.lock();
        let Some(registry) = self.started_registry(&mut inner) else {
            return false;
        };
        if registry.resume(&self.job_id) {
            inner.enabled = true;
            info!(job_id = %self.job_id, "▶️ Job enabled");
            true
        } else {
            warn!(job_id = %self.job_id, "⚠️ Job not found, cannot enable");
            false
        }
    }

    /// Pause the job. Does not start a stopped scheduler.
    pub fn disable(&self) -> bool {
        let mut inner = self.lock();
        let Some(registry) = inner
            .worker
            .as_ref()
            .filter(|w| w.is_alive())
            .map(|w| w.registry.clone())
        else {
            warn!(job_id = %self.job_id, "⚠️ Scheduler not running, cannot disable");
            return false;
        };
        if registry.pause(&self.job_id) {
            inner.enabled = false;
            info!(job_id = %self.job_id, "⏸️ Job disabled");
            true
        } else {
            warn!(job_id = %self.job_id, "⚠️ Job not found, cannot disable");
            false
        }
    }

    pub fn status(&self) -> SchedulerStatus {
        let inner = self.lock();
        SchedulerStatus {
            enabled: inner.enabled,
            interval: inner.interval_minutes,
            running: inner.worker.as_ref().is_some_and(Worker::is_alive),
        }
    }

    /// Remove the job, signal the worker and join its thread.
    ///
    /// Blocks until an in-flight run has finished. Safe to call repeatedly.
    /// Control calls made while the join is pending fail instead of starting
    /// a fresh worker.
    pub fn stop(&self) {
        let worker = {
            let mut inner = self.lock();
            let Some(worker) = inner.worker.take() else {
                info!(job_id = %self.job_id, "Scheduler not running, nothing to stop");
                return;
            };
            inner.stopping = true;
            worker
        };

        worker.registry.remove(&self.job_id);
        worker.shutdown.cancel();
        if worker.thread.join().is_err() {
            error!(job_id = %self.job_id, "💥 Scheduler thread panicked");
        }
        self.lock().stopping = false;
        info!(job_id = %self.job_id, "🛑 Scheduler stopped");
    }
}

impl Drop for CrawlerScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline.into()).await,
        None => std::future::pending().await,
    }
}

async fn run_worker(registry: Arc<JobRegistry>, shutdown: CancellationToken) {
    debug!("Scheduler worker loop started");
    loop {
        for (id, job) in registry.claim_due(Instant::now()) {
            if shutdown.is_cancelled() {
                break;
            }
            info!(job_id = %id, "⏰ Running {}", job.name());
            let started = Instant::now();
            job.run().await;
            info!(
                job_id = %id,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "✨ Finished {}",
                job.name()
            );
        }

        let deadline = registry.next_deadline();
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = registry.notified() => {}
            _ = sleep_until(deadline) => {}
        }
    }
    debug!("Scheduler worker loop exited");
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingJob {
        started: AtomicUsize,
        finished: AtomicUsize,
        delay: Duration,
    }

    #[async_trait]
    impl CrawlJob for CountingJob {
        fn name(&self) -> &str {
            "counting job"
        }

        async fn run(&self) {
            self.started.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.finished.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn scheduler(job: Arc<CountingJob>) -> CrawlerScheduler {
        CrawlerScheduler::new(job, SchedulerConfig::default())
    }

    fn wait_for(condition: impl Fn() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        condition()
    }

    #[test]
    fn test_defaults() {
        let scheduler = scheduler(Arc::new(CountingJob::default()));
        assert_eq!(scheduler.job_id(), "tagesschau_main_page_crawler");
        assert_eq!(
            scheduler.status(),
            SchedulerStatus {
                enabled: true,
                interval: 60,
                running: false
            }
        );
    }

    #[test]
    fn test_start_twice_keeps_one_worker() {
        let scheduler = scheduler(Arc::new(CountingJob::default()));
        scheduler.start().unwrap();
        let first = scheduler.lock().worker.as_ref().unwrap().registry.clone();

        scheduler.start().unwrap();
        let second = scheduler.lock().worker.as_ref().unwrap().registry.clone();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(scheduler.is_running());
        scheduler.stop();
    }

    #[test]
    fn test_first_run_waits_one_interval() {
        let job = Arc::new(CountingJob::default());
        let scheduler = scheduler(job.clone());
        scheduler.start().unwrap();
        std::thread::sleep(Duration::from_millis(100));
        assert_eq!(job.started.load(Ordering::SeqCst), 0);
        scheduler.stop();
    }

    #[test]
    fn test_stop() {
        let scheduler = scheduler(Arc::new(CountingJob::default()));
        scheduler.stop();
        scheduler.start().unwrap();
        scheduler.stop();
        assert!(!scheduler.is_running());
        assert!(!scheduler.status().running);
        scheduler.stop();
    }

    #[test]
    fn test_trigger_now_auto_starts_and_runs() {
        let job = Arc::new(CountingJob::default());
        let scheduler = scheduler(job.clone());
        assert!(scheduler.trigger_now());
        assert!(scheduler.is_running());
        assert!(wait_for(|| job.finished.load(Ordering::SeqCst) == 1));
        scheduler.stop();
    }

    #[test]
    fn test_no_runs_after_stop() {
        let job = Arc::new(CountingJob::default());
        let scheduler = scheduler(job.clone());
        scheduler.trigger_now();
        assert!(wait_for(|| job.finished.load(Ordering::SeqCst) == 1));
        scheduler.stop();

        std::thread::sleep(Duration::from_millis(100));
        assert_eq!(job.started.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_stop_waits_for_running_job() {
        let job = Arc::new(CountingJob {
            delay: Duration::from_millis(300),
            ..Default::default()
        });
        let scheduler = scheduler(job.clone());
        scheduler.trigger_now();
        assert!(wait_for(|| job.started.load(Ordering::SeqCst) == 1));

        scheduler.stop();
        assert_eq!(job.finished.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_controls_during_stop_do_not_restart() {
        let job = Arc::new(CountingJob {
            delay: Duration::from_millis(400),
            ..Default::default()
        });
        let scheduler = Arc::new(scheduler(job.clone()));
        assert!(scheduler.trigger_now());
        assert!(wait_for(|| job.started.load(Ordering::SeqCst) == 1));

        let controller = {
            let scheduler = scheduler.clone();
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(100));
                (
                    scheduler.trigger_now(),
                    scheduler.enable(),
                    scheduler.update_interval(5),
                )
            })
        };
        scheduler.stop();
        let (triggered, enabled, updated) = controller.join().unwrap();

        assert!(!triggered);
        assert!(!enabled);
        assert!(matches!(updated, Err(Error::Scheduler(_))));
        assert!(!scheduler.is_running());
        assert_eq!(scheduler.interval(), 60);

        std::thread::sleep(Duration::from_millis(100));
        assert_eq!(job.started.load(Ordering::SeqCst), 1);

        // Once the stop has completed the scheduler can be restarted
        assert!(scheduler.trigger_now());
        assert!(wait_for(|| job.finished.load(Ordering::SeqCst) == 2));
        scheduler.stop();
    }

    #[derive(Default)]
    struct OverlapJob {
        active: AtomicUsize,
        max_active: AtomicUsize,
        runs: AtomicUsize,
    }

    #[async_trait]
    impl CrawlJob for OverlapJob {
        fn name(&self) -> &str {
            "overlap job"
        }

        async fn run(&self) {
            let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(active, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            self.runs.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_concurrent_controls_run_one_crawl_at_a_time() {
        let job = Arc::new(OverlapJob::default());
        let scheduler = Arc::new(CrawlerScheduler::new(
            job.clone(),
            SchedulerConfig::default(),
        ));

        let handles: Vec<_> = (0..4u64)
            .map(|t| {
                let scheduler = scheduler.clone();
                std::thread::spawn(move || {
                    for i in 0..50u64 {
                        match (t + i) % 4 {
                            0 => {
                                scheduler.trigger_now();
                            }
                            1 => {
                                let minutes = ((i % 3) + 1) as i64 * 10;
                                assert!(scheduler.update_interval(minutes).unwrap());
                            }
                            2 => {
                                scheduler.disable();
                            }
                            _ => {
                                scheduler.enable();
                            }
                        }
                        let status = scheduler.status();
                        assert!([10, 20, 30, 60].contains(&status.interval));
                    }
                })
            })
            .collect();

        assert!(wait_for(|| handles.iter().all(|h| h.is_finished())));
        for handle in handles {
            handle.join().unwrap();
        }

        assert!(wait_for(|| job.runs.load(Ordering::SeqCst) >= 1));
        let status = scheduler.status();
        let registry = scheduler.lock().worker.as_ref().unwrap().registry.clone();
        assert_eq!(registry.is_paused(DEFAULT_JOB_ID), Some(!status.enabled));
        assert!(status.running);

        scheduler.stop();
        assert_eq!(job.active.load(Ordering::SeqCst), 0);
        assert_eq!(job.max_active.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_interval_change_with_pending_trigger_runs_once() {
        let job = Arc::new(CountingJob {
            delay: Duration::from_millis(200),
            ..Default::default()
        });
        let scheduler = scheduler(job.clone());
        assert!(scheduler.trigger_now());
        assert!(wait_for(|| job.started.load(Ordering::SeqCst) == 1));

        // The worker is busy, so this trigger stays pending
        assert!(scheduler.trigger_now());
        assert!(scheduler.update_interval(1).unwrap());

        assert!(wait_for(|| job.finished.load(Ordering::SeqCst) == 2));
        std::thread::sleep(Duration::from_millis(300));
        assert_eq!(job.started.load(Ordering::SeqCst), 2);

        // The next regular run is one new interval out, not lost
        let registry = scheduler.lock().worker.as_ref().unwrap().registry.clone();
        let deadline = registry.next_deadline().unwrap();
        assert!(deadline > Instant::now() + Duration::from_secs(30));
        assert!(deadline <= Instant::now() + Duration::from_secs(60));
        scheduler.stop();
    }

    #[test]
    fn test_update_interval() {
        let scheduler = scheduler(Arc::new(CountingJob::default()));
        for m in [1, 5, 60, 1440] {
            assert!(scheduler.update_interval(m).unwrap());
            assert_eq!(scheduler.interval(), m as u64);
        }
        assert!(scheduler.is_running());

        for m in [0, -1, -60] {
            assert!(matches!(
                scheduler.update_interval(m),
                Err(Error::InvalidInterval(got)) if got == m
            ));
            assert_eq!(scheduler.interval(), 1440);
        }
        scheduler.stop();
    }

    #[test]
    fn test_disable_when_stopped() {
        let scheduler = scheduler(Arc::new(CountingJob::default()));
        assert!(!scheduler.disable());
        assert!(!scheduler.is_running());
        assert!(scheduler.status().enabled);
    }

    #[test]
    fn test_enable_disable() {
        let scheduler = scheduler(Arc::new(CountingJob::default()));
        assert!(scheduler.enable());
        assert!(scheduler.is_running());

        assert!(scheduler.disable());
        assert!(!scheduler.status().enabled);
        assert!(scheduler.is_running());

        assert!(scheduler.enable());
        assert!(scheduler.status().enabled);
        scheduler.stop();
    }

    #[test]
    fn test_disabled_state_survives_restart() {
        let scheduler = scheduler(Arc::new(CountingJob::default()));
        scheduler.start().unwrap();
        scheduler.disable();
        scheduler.stop();

        scheduler.start().unwrap();
        let registry = scheduler.lock().worker.as_ref().unwrap().registry.clone();
        assert_eq!(registry.is_paused(DEFAULT_JOB_ID), Some(true));
        scheduler.stop();
    }

    #[test]
    fn test_trigger_while_disabled_runs_once() {
        let job = Arc::new(CountingJob::default());
        let scheduler = CrawlerScheduler::new(
            job.clone(),
            SchedulerConfig {
                enabled: false,
                ..Default::default()
            },
        );
        assert!(scheduler.trigger_now());
        assert!(wait_for(|| job.finished.load(Ordering::SeqCst) == 1));
        assert!(!scheduler.status().enabled);
        scheduler.stop();
    }

    #[test]
    fn test_drop_stops_worker() {
        let job = Arc::new(CountingJob::default());
        {
            let scheduler = scheduler(job.clone());
            scheduler.trigger_now();
            assert!(wait_for(|| job.finished.load(Ordering::SeqCst) == 1));
        }
        // The job Arc is only shared with the test once the worker is gone
        assert_eq!(Arc::strong_count(&job), 1);
    }
}
