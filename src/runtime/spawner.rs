use tokio::runtime::Handle;

use super::{Job, Scheduler, handle};

/// Spawns store jobs onto a tokio runtime.
///
/// Jobs run concurrently with each other; the store serializes their effect on
/// its state.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    /// Uses the current runtime, or the crate's global runtime when called
    /// outside of one.
    #[must_use]
    pub fn current() -> Self {
        Self { handle: handle() }
    }

    /// Uses an explicit runtime handle.
    #[must_use]
    pub const fn with_handle(handle: Handle) -> Self {
        Self { handle }
    }

    /// Returns the runtime handle jobs are spawned on.
    #[must_use]
    pub const fn runtime_handle(&self) -> &Handle {
        &self.handle
    }
}

impl Default for TokioScheduler {
    fn default() -> Self {
        Self::current()
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, job: Job) {
        tracing::trace!("scheduler.tokio.spawn");
        drop(self.handle.spawn(job));
    }
}
