use std::collections::VecDeque;

use futures::executor::block_on;
use parking_lot::Mutex;

use super::{Job, Scheduler};

/// Queues store jobs until the host runs them.
///
/// Suited to hosts with their own frame loop and to tests that need to pick
/// the order in which persistence results arrive. Jobs are driven with
/// [`futures::executor::block_on`], so they must not depend on a tokio
/// reactor (the in-memory service qualifies as long as fail injection adds no
/// delay).
///
/// # Example
///
/// ```rust
/// use futures::FutureExt;
/// use taskstore::runtime::{QueueScheduler, Scheduler};
///
/// let scheduler = QueueScheduler::new();
/// scheduler.schedule(async {}.boxed());
/// scheduler.schedule(async {}.boxed());
///
/// assert_eq!(scheduler.len(), 2);
/// assert!(scheduler.run_newest());
/// assert_eq!(scheduler.run_all(), 1);
/// assert!(scheduler.is_empty());
/// ```
#[derive(Default)]
pub struct QueueScheduler {
    jobs: Mutex<VecDeque<Job>>,
}

impl QueueScheduler {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of queued jobs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.jobs.lock().len()
    }

    /// Returns `true` if no job is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.jobs.lock().is_empty()
    }

    /// Runs the oldest queued job to completion. Returns `false` if the queue
    /// was empty.
    pub fn run_next(&self) -> bool {
        let job = self.jobs.lock().pop_front();
        Self::run(job)
    }

    /// Runs the most recently queued job to completion. Returns `false` if the
    /// queue was empty.
    pub fn run_newest(&self) -> bool {
        let job = self.jobs.lock().pop_back();
        Self::run(job)
    }

    /// Runs queued jobs oldest first until the queue is empty, including jobs
    /// scheduled while draining. Returns how many jobs ran.
    pub fn run_all(&self) -> usize {
        let mut completed = 0;
        while self.run_next() {
            completed += 1;
        }
        completed
    }

    fn run(job: Option<Job>) -> bool {
        match job {
            Some(job) => {
                tracing::trace!("scheduler.queue.run");
                block_on(job);
                true
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for QueueScheduler {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("QueueScheduler")
            .field("queued", &self.len())
            .finish()
    }
}

impl Scheduler for QueueScheduler {
    fn schedule(&self, job: Job) {
        let mut jobs = self.jobs.lock();
        jobs.push_back(job);
        tracing::trace!(queued = jobs.len(), "scheduler.queue.push");
    }
}
