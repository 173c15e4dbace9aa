use std::sync::{Arc, Weak};
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use parking_lot::Mutex;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::StoreConfig;
use crate::domain::{Partition, PendingIds, Task, TaskId};
use crate::error::{
    CacheError, PersistenceError, RollbackError, ValidationError, validate_subject,
};
use crate::observer::StoreObserver;
use crate::runtime::Scheduler;
use crate::service::TaskService;

use super::auto_refresh::AutoRefresh;
use super::cache::TaskCache;
use super::epoch::Epoch;
use super::state::{RefreshOutcome, StoreState};

// =============================================================================
// Snapshot
// =============================================================================

/// Everything the presentation layer renders, captured under one lock.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StoreSnapshot {
    /// Tasks of the pending partition in display order.
    pub pending: Vec<Task>,
    /// Tasks of the completed partition in display order.
    pub completed: Vec<Task>,
    /// Ids under any in-flight mutation, ascending.
    pub pending_ids: Vec<TaskId>,
    /// Whether the pending partition has an outstanding fetch.
    pub refreshing_pending: bool,
    /// Whether the completed partition has an outstanding fetch.
    pub refreshing_completed: bool,
}

impl StoreSnapshot {
    /// Returns the tasks of one partition.
    #[must_use]
    pub fn tasks(&self, partition: Partition) -> &[Task] {
        match partition {
            Partition::Pending => &self.pending,
            Partition::Completed => &self.completed,
        }
    }
}

// =============================================================================
// Inner State
// =============================================================================

struct StoreInner {
    state: Mutex<StoreState>,
    service: Arc<dyn TaskService>,
    observer: Arc<dyn StoreObserver>,
    scheduler: Arc<dyn Scheduler>,
}

impl StoreInner {
    /// Schedules a job that issues `call` and hands its output to `settle`.
    ///
    /// The job holds only a weak reference to the store. The service future is
    /// created when the job first runs; if the store is gone by then, or by
    /// the time the future resolves, the job ends without touching anything.
    fn persist<R, C, S>(self: &Arc<Self>, call: C, settle: S)
    where
        R: Send + 'static,
        C: FnOnce(&dyn TaskService) -> BoxFuture<'static, R> + Send + 'static,
        S: FnOnce(&Self, R) + Send + 'static,
    {
        let weak: Weak<Self> = Arc::downgrade(self);
        let job = async move {
            let Some(future) = weak.upgrade().map(|inner| call(inner.service.as_ref())) else {
                tracing::debug!("store.job.dropped_before_start");
                return;
            };
            let output = future.await;
            match weak.upgrade() {
                Some(inner) => settle(&inner, output),
                None => tracing::debug!("store.job.result_discarded"),
            }
        };
        self.scheduler.schedule(job.boxed());
    }

    fn reject(&self, error: &ValidationError) {
        tracing::debug!(%error, "store.input_rejected");
        self.observer.on_error(&error.to_string());
    }

    /// Reports a rollback, if any, then notifies the change.
    fn finish(&self, id: TaskId, outcome: Result<(), RollbackError>) {
        match outcome {
            Ok(()) => tracing::debug!(%id, "store.mutation.persisted"),
            Err(error) => {
                tracing::warn!(
                    %id,
                    kind = error.kind.as_str(),
                    cause = %error.source,
                    "store.mutation.rolled_back"
                );
                self.observer.on_error(&error.to_string());
            }
        }
        self.observer.on_change();
    }

    fn settle_refresh(
        &self,
        partition: Partition,
        epoch: Epoch,
        result: Result<Vec<Task>, PersistenceError>,
    ) {
        let outcome = self.state.lock().settle_refresh(partition, epoch, result);
        match outcome {
            RefreshOutcome::Stale => {
                tracing::debug!(%partition, epoch = epoch.get(), "store.refresh.stale");
                return;
            }
            RefreshOutcome::Applied { changed } => {
                tracing::debug!(%partition, epoch = epoch.get(), changed, "store.refresh.merged");
            }
            RefreshOutcome::Failed(error) => {
                tracing::warn!(%partition, %error, "store.refresh.failed");
            }
        }
        self.observer.on_change();
    }

    fn settle_warm(&self, epochs: [Epoch; 2], results: [Result<Vec<Task>, PersistenceError>; 2]) {
        for (partition, result) in Partition::ALL.into_iter().zip(&results) {
            if let Err(error) = result {
                tracing::warn!(%partition, %error, "store.warm.failed");
            }
        }
        let applied = self.state.lock().settle_warm(epochs, results);
        tracing::debug!(applied, "store.warm.settled");
        self.observer.on_change();
    }
}

// =============================================================================
// Task Store
// =============================================================================

/// Optimistic two-partition task cache.
///
/// Every operation applies its effect to the cache synchronously, notifies
/// the observer, and hands the persistence call to the scheduler. When the
/// call settles the store either keeps the optimistic change or rolls it back
/// exactly, reports the failure through [`StoreObserver::on_error`], and
/// notifies again.
///
/// `TaskStore` is a cheap, clonable handle. Jobs still in flight when the last
/// handle is dropped are discarded on completion.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use taskstore::domain::Partition;
/// use taskstore::observer::TracingObserver;
/// use taskstore::runtime::QueueScheduler;
/// use taskstore::service::InMemoryTaskService;
/// use taskstore::TaskStore;
///
/// let service = InMemoryTaskService::new();
/// service.seed("Water plants", false);
/// let scheduler = Arc::new(QueueScheduler::new());
/// let store = TaskStore::new(
///     Arc::new(service.clone()),
///     Arc::new(TracingObserver),
///     scheduler.clone(),
/// );
///
/// store.warm_cache_both();
/// scheduler.run_all();
///
/// let placeholder = store.create_task("Call mom").unwrap();
/// assert!(placeholder.is_placeholder());
/// assert_eq!(store.tasks(Partition::Pending)[0].subject, "Call mom");
///
/// scheduler.run_all();
/// assert_eq!(store.tasks(Partition::Pending).len(), 2);
/// assert!(store.pending_ids().is_empty());
/// ```
#[derive(Clone)]
pub struct TaskStore {
    inner: Arc<StoreInner>,
}

impl std::fmt::Debug for TaskStore {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("TaskStore")
            .field("state", &*self.inner.state.lock())
            .finish_non_exhaustive()
    }
}

impl TaskStore {
    /// Creates an empty store wired to its collaborators.
    #[must_use]
    pub fn new(
        service: Arc<dyn TaskService>,
        observer: Arc<dyn StoreObserver>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        Self::from_state(service, observer, scheduler, StoreState::default())
    }

    /// Creates a store whose cache starts with `cache`, for example one
    /// restored from an earlier [`StoreSnapshot`].
    ///
    /// # Errors
    ///
    /// Returns a [`CacheError`] if `cache` holds a placeholder or other
    /// non-positive id, the same id twice, or a task whose `completed` flag
    /// does not match its partition.
    pub fn with_cache(
        service: Arc<dyn TaskService>,
        observer: Arc<dyn StoreObserver>,
        scheduler: Arc<dyn Scheduler>,
        cache: TaskCache,
    ) -> Result<Self, CacheError> {
        cache.validate()?;
        Ok(Self::from_state(
            service,
            observer,
            scheduler,
            StoreState::with_cache(cache),
        ))
    }

    fn from_state(
        service: Arc<dyn TaskService>,
        observer: Arc<dyn StoreObserver>,
        scheduler: Arc<dyn Scheduler>,
        state: StoreState,
    ) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                state: Mutex::new(state),
                service,
                observer,
                scheduler,
            }),
        }
    }

    /// Applies host settings: warms both partitions if configured and starts
    /// periodic refresh if an interval is set.
    ///
    /// Periodic refresh needs a tokio runtime; see [`Self::spawn_auto_refresh`].
    #[must_use = "periodic refresh stops when the returned guard is dropped"]
    pub fn start(&self, config: &StoreConfig) -> Option<AutoRefresh> {
        if config.warm_on_start {
            self.warm_cache_both();
        }
        config
            .refresh_interval
            .map(|interval| self.spawn_auto_refresh(interval))
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Returns a copy of one partition in display order.
    #[must_use]
    pub fn tasks(&self, partition: Partition) -> Vec<Task> {
        self.inner.state.lock().cache.tasks(partition).to_vec()
    }

    /// Returns `true` while `partition` has an outstanding, still-current
    /// fetch.
    #[must_use]
    pub fn is_refreshing(&self, partition: Partition) -> bool {
        self.inner.state.lock().is_refreshing(partition)
    }

    /// Returns a copy of the ids under any in-flight mutation.
    #[must_use]
    pub fn pending_ids(&self) -> PendingIds {
        self.inner.state.lock().pending.clone()
    }

    /// Returns a copy of the ids whose delete is in flight.
    #[must_use]
    pub fn pending_delete_ids(&self) -> PendingIds {
        self.inner.state.lock().pending_deletes.clone()
    }

    /// Captures both partitions, the pending ids, and the refreshing flags
    /// atomically.
    #[must_use]
    pub fn snapshot(&self) -> StoreSnapshot {
        let state = self.inner.state.lock();
        let [refreshing_pending, refreshing_completed] = state.refreshing_flags();
        StoreSnapshot {
            pending: state.cache.tasks(Partition::Pending).to_vec(),
            completed: state.cache.tasks(Partition::Completed).to_vec(),
            pending_ids: state.pending.iter().collect(),
            refreshing_pending,
            refreshing_completed,
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Optimistically adds a task to the top of the pending partition.
    ///
    /// Returns the placeholder id the task carries until the service confirms
    /// it.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptySubject`] (also reported through
    /// `on_error`) if `title` is empty after trimming. Nothing else happens in
    /// that case.
    pub fn create_task(&self, title: &str) -> Result<TaskId, ValidationError> {
        let subject = validate_subject(title).inspect_err(|error| self.inner.reject(error))?;

        let ticket = self.inner.state.lock().begin_create(subject);
        let placeholder_id = ticket.placeholder_id;
        tracing::debug!(id = %placeholder_id, "store.create");
        self.inner.observer.on_change();

        let subject = ticket.subject.clone();
        self.inner.persist(
            move |service| service.add_task(subject),
            move |inner, result| {
                let outcome = inner.state.lock().settle_create(&ticket, result);
                inner.finish(ticket.placeholder_id, outcome);
            },
        );
        Ok(placeholder_id)
    }

    /// Optimistically removes a task.
    ///
    /// Returns `false` without side effects if `id` is not cached or is a
    /// placeholder.
    pub fn delete_task(&self, id: TaskId) -> bool {
        let Some(ticket) = self.inner.state.lock().begin_delete(id) else {
            tracing::debug!(%id, "store.delete.ignored");
            return false;
        };
        tracing::debug!(%id, "store.delete");
        self.inner.observer.on_change();

        self.inner.persist(
            move |service| service.delete_task(id),
            move |inner, result| {
                let outcome = inner.state.lock().settle_delete(ticket, result);
                inner.finish(id, outcome);
            },
        );
        true
    }

    /// Optimistically moves a task to the front of the partition matching
    /// `completed`.
    ///
    /// Returns `false` without side effects if `id` is not cached, is a
    /// placeholder, or already lives in that partition.
    pub fn toggle_completed(&self, id: TaskId, completed: bool) -> bool {
        let Some(ticket) = self.inner.state.lock().begin_toggle(id, completed) else {
            tracing::debug!(%id, completed, "store.toggle.ignored");
            return false;
        };
        tracing::debug!(%id, completed, "store.toggle");
        self.inner.observer.on_change();

        let completed = ticket.completed;
        self.inner.persist(
            move |service| service.toggle_completed(id, completed),
            move |inner, result| {
                let outcome = inner.state.lock().settle_toggle(ticket, result);
                inner.finish(id, outcome);
            },
        );
        true
    }

    /// Optimistically replaces the subject of a task in place.
    ///
    /// Returns `Ok(false)` without side effects if `id` is not cached, is a
    /// placeholder, or already has the trimmed subject.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptySubject`] (also reported through
    /// `on_error`) if `subject` is empty after trimming.
    pub fn update_subject(&self, id: TaskId, subject: &str) -> Result<bool, ValidationError> {
        let begun = self.inner.state.lock().begin_rename(id, subject);
        let Some(ticket) = begun.inspect_err(|error| self.inner.reject(error))? else {
            tracing::debug!(%id, "store.rename.ignored");
            return Ok(false);
        };
        tracing::debug!(%id, "store.rename");
        self.inner.observer.on_change();

        let subject = ticket.subject.clone();
        self.inner.persist(
            move |service| service.update_subject(id, subject),
            move |inner, result| {
                let outcome = inner.state.lock().settle_rename(ticket, result);
                inner.finish(id, outcome);
            },
        );
        Ok(true)
    }

    // =========================================================================
    // Refresh
    // =========================================================================

    /// Fetches one partition in the background and merges it into the cache.
    ///
    /// A later refresh of the same partition supersedes this one; its result
    /// is then discarded.
    pub fn refresh_partition(&self, partition: Partition) {
        let epoch = self.inner.state.lock().begin_refresh(partition);
        tracing::debug!(%partition, epoch = epoch.get(), "store.refresh");
        self.inner.observer.on_change();

        self.inner.persist(
            move |service| service.get_tasks(partition),
            move |inner, result| inner.settle_refresh(partition, epoch, result),
        );
    }

    /// Fetches both partitions concurrently and applies them together.
    ///
    /// Nothing is applied unless both fetches succeed and neither partition
    /// was refreshed again in the meantime.
    pub fn warm_cache_both(&self) {
        let epochs = self.inner.state.lock().begin_warm();
        tracing::debug!(
            pending_epoch = epochs[0].get(),
            completed_epoch = epochs[1].get(),
            "store.warm"
        );
        self.inner.observer.on_change();

        self.inner.persist(
            |service| {
                let pending = service.get_tasks(Partition::Pending);
                let completed = service.get_tasks(Partition::Completed);
                futures::future::join(pending, completed)
                    .map(|(pending, completed)| [pending, completed])
                    .boxed()
            },
            move |inner, results| inner.settle_warm(epochs, results),
        );
    }

    /// Starts refreshing both partitions every `interval` on the current
    /// tokio runtime (or the crate's global runtime outside of one).
    ///
    /// The first refresh happens one `interval` after the call. The loop ends
    /// when the returned guard is dropped or when every handle to this store
    /// has been dropped.
    #[must_use = "periodic refresh stops when the returned guard is dropped"]
    pub fn spawn_auto_refresh(&self, interval: Duration) -> AutoRefresh {
        let weak = Arc::downgrade(&self.inner);
        AutoRefresh::spawn(interval, move || match weak.upgrade() {
            Some(inner) => {
                Self { inner }.warm_cache_both();
                true
            }
            None => false,
        })
    }
}
