use at_core::CrawlJob;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::Notify;

/// Stand-in for intervals too large to add to an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(30 * 365 * 24 * 3600);

fn after(now: Instant, interval: Duration) -> Instant {
    now.checked_add(interval).unwrap_or_else(|| now + FAR_FUTURE)
}

struct JobEntry {
    job: Arc<dyn CrawlJob>,
    interval: Duration,
    next_run: Instant,
    paused: bool,
    /// One-off run requested; fires even while paused
    forced: bool,
}

impl JobEntry {
    fn due_at(&self) -> Option<Instant> {
        if self.forced {
            Some(self.next_run.min(Instant::now()))
        } else if self.paused {
            None
        } else {
            Some(self.next_run)
        }
    }
}

/// Interval jobs keyed by id, shared between the control side and the worker.
///
/// Every mutation wakes the worker so it can recompute its next deadline.
pub struct JobRegistry {
    jobs: Mutex<HashMap<String, JobEntry>>,
    wake: Notify,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self {
            jobs: Mutex::new(HashMap::new()),
            wake: Notify::new(),
        }
    }

    fn jobs(&self) -> MutexGuard<'_, HashMap<String, JobEntry>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update(&self, id: &str, f: impl FnOnce(&mut JobEntry)) -> bool {
        let found = match self.jobs().get_mut(id) {
            Some(entry) => {
                f(entry);
                true
            }
            None => false,
        };
        if found {
            self.wake.notify_one();
        }
        found
    }

    /// Register `job`; its first run is one `interval` from now.
    pub fn add(&self, id: &str, job: Arc<dyn CrawlJob>, interval: Duration, paused: bool) {
        self.jobs().insert(
            id.to_string(),
            JobEntry {
                job,
                interval,
                next_run: after(Instant::now(), interval),
                paused,
                forced: false,
            },
        );
        self.wake.notify_one();
    }

    pub fn remove(&self, id: &str) -> bool {
        let removed = self.jobs().remove(id).is_some();
        self.wake.notify_one();
        removed
    }

    pub fn contains(&self, id: &str) -> bool {
        self.jobs().contains_key(id)
    }

    /// Replace the interval; the next run moves to now + `interval`.
    pub fn reschedule(&self, id: &str, interval: Duration) -> bool {
        self.update(id, |entry| {
            entry.interval = interval;
            entry.next_run = after(Instant::now(), interval);
        })
    }

    pub fn run_now(&self, id: &str) -> bool {
        self.update(id, |entry| {
            entry.next_run = Instant::now();
            entry.forced = true;
        })
    }

    pub fn pause(&self, id: &str) -> bool {
        self.update(id, |entry| entry.paused = true)
    }

    /// Resume a paused job. Runs missed while paused are not replayed.
    pub fn resume(&self, id: &str) -> bool {
        self.update(id, |entry| {
            entry.paused = false;
            let now = Instant::now();
            if entry.next_run < now {
                entry.next_run = after(now, entry.interval);
            }
        })
    }

    pub fn is_paused(&self, id: &str) -> Option<bool> {
        self.jobs().get(id).map(|entry| entry.paused)
    }

    /// Earliest instant any job wants to run, if any job is active.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.jobs().values().filter_map(JobEntry::due_at).min()
    }

    /// Take every job due at `now` and push its next run one interval out.
    ///
    /// Claiming and rescheduling happen under one lock, so a due tick is
    /// handed out exactly once.
    pub fn claim_due(&self, now: Instant) -> Vec<(String, Arc<dyn CrawlJob>)> {
        let mut jobs = self.jobs();
        let mut due = Vec::new();
        for (id, entry) in jobs.iter_mut() {
            if entry.due_at().is_some_and(|at| at <= now) {
                entry.next_run = after(now, entry.interval);
                entry.forced = false;
                due.push((id.clone(), entry.job.clone()));
            }
        }
        due
    }

    pub async fn notified(&self) {
        self.wake.notified().await
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}
