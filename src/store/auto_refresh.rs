use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::runtime::handle;

/// Shortest accepted refresh period.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Guard for a periodic refresh loop started by
/// [`TaskStore::spawn_auto_refresh`](super::TaskStore::spawn_auto_refresh).
///
/// Dropping the guard aborts the loop. The loop also ends on its own once
/// every handle to the store has been dropped.
#[derive(Debug)]
pub struct AutoRefresh {
    task: JoinHandle<()>,
    interval: Duration,
}

impl AutoRefresh {
    /// Spawns a loop that calls `tick` every `interval` until it returns
    /// `false`. The first call happens one `interval` after spawning.
    pub(crate) fn spawn<F>(interval: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let interval = interval.max(MIN_INTERVAL);
        let task = handle().spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if !tick() {
                    tracing::debug!("store.auto_refresh.store_dropped");
                    break;
                }
            }
        });
        tracing::debug!(?interval, "store.auto_refresh.started");
        Self { task, interval }
    }

    /// Returns the refresh period.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns `true` once the loop has ended.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for AutoRefresh {
    fn drop(&mut self) {
        self.task.abort();
    }
}
