//! Scheduling contract for persistence and refresh jobs.
//!
//! The store never awaits its own work. Every persistence call and fetch is
//! wrapped in a [`Job`] and handed to a [`Scheduler`], which decides where and
//! when it runs:
//!
//! - [`TokioScheduler`]: spawns jobs onto a tokio runtime
//! - [`QueueScheduler`]: queues jobs until the host drains them

mod global;
mod queue;
mod spawner;

use futures::future::BoxFuture;

pub use global::{global, handle};
pub use queue::QueueScheduler;
pub use spawner::TokioScheduler;

/// A fire-and-forget unit of work produced by the store.
pub type Job = BoxFuture<'static, ()>;

/// Executes store jobs.
///
/// `schedule` must not run the job inline on the caller's stack: the store
/// calls it right after releasing its state lock and expects to return to the
/// caller immediately.
pub trait Scheduler: Send + Sync {
    /// Accepts a job for later execution.
    fn schedule(&self, job: Job);
}

impl<S: Scheduler + ?Sized> Scheduler for std::sync::Arc<S> {
    fn schedule(&self, job: Job) {
        (**self).schedule(job);
    }
}
