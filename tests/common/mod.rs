//! Common test helpers for integration tests.
//!
//! # Usage
//!
//! ```ignore
//! mod common;
//! use common::{Harness, ids};
//! ```
//!
//! # Note
//!
//! The `#![allow(dead_code)]` attribute is necessary because Rust compiles each
//! integration test file as a separate crate, and not every file uses every
//! helper.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use taskstore::TaskStore;
use taskstore::domain::{Partition, Task, TaskId};
use taskstore::observer::StoreObserver;
use taskstore::runtime::QueueScheduler;
use taskstore::service::InMemoryTaskService;
use taskstore::store::TaskCache;

// =============================================================================
// Recording Observer
// =============================================================================

/// Observer that counts change notifications and keeps every error message.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    changes: AtomicUsize,
    errors: Mutex<Vec<String>>,
}

impl RecordingObserver {
    pub fn changes(&self) -> usize {
        self.changes.load(Ordering::SeqCst)
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().clone()
    }
}

impl StoreObserver for RecordingObserver {
    fn on_change(&self) {
        self.changes.fetch_add(1, Ordering::SeqCst);
    }

    fn on_error(&self, message: &str) {
        self.errors.lock().push(message.to_string());
    }
}

// =============================================================================
// Harness
// =============================================================================

/// A store wired to an in-memory service and a manually drained queue.
pub struct Harness {
    pub store: TaskStore,
    pub service: InMemoryTaskService,
    pub scheduler: Arc<QueueScheduler>,
    pub observer: Arc<RecordingObserver>,
}

impl Harness {
    /// Empty service, empty cache.
    pub fn new() -> Self {
        Self::with_service(InMemoryTaskService::new())
    }

    /// Empty cache over an existing service.
    pub fn with_service(service: InMemoryTaskService) -> Self {
        let scheduler = Arc::new(QueueScheduler::new());
        let observer = Arc::new(RecordingObserver::default());
        let store = TaskStore::new(
            Arc::new(service.clone()),
            observer.clone(),
            scheduler.clone(),
        );
        Self {
            store,
            service,
            scheduler,
            observer,
        }
    }

    /// Seeds the service with `(subject, completed)` rows, oldest first, then
    /// warms the cache and drains the queue.
    pub fn seeded(rows: &[(&str, bool)]) -> Self {
        let harness = Self::new();
        for (subject, completed) in rows {
            harness.service.seed(subject, *completed);
        }
        harness.store.warm_cache_both();
        harness.scheduler.run_all();
        harness
    }

    /// Cache primed directly, bypassing the service.
    pub fn with_cache(pending: Vec<Task>, completed: Vec<Task>) -> Self {
        let service = InMemoryTaskService::new();
        let scheduler = Arc::new(QueueScheduler::new());
        let observer = Arc::new(RecordingObserver::default());
        let store = TaskStore::with_cache(
            Arc::new(service.clone()),
            observer.clone(),
            scheduler.clone(),
            TaskCache::from_parts(pending, completed),
        )
        .expect("seeded cache is valid");
        Self {
            store,
            service,
            scheduler,
            observer,
        }
    }

    pub fn ids(&self, partition: Partition) -> Vec<i64> {
        ids(&self.store.tasks(partition))
    }

    pub fn pending_ids(&self) -> Vec<i64> {
        self.store.pending_ids().iter().map(TaskId::get).collect()
    }
}

pub fn ids(tasks: &[Task]) -> Vec<i64> {
    tasks.iter().map(|task| task.id.get()).collect()
}

/// Asserts that no id appears twice across both partitions and that every
/// task sits in the partition its flag says.
pub fn assert_partitions_consistent(store: &TaskStore) {
    let pending = store.tasks(Partition::Pending);
    let completed = store.tasks(Partition::Completed);

    assert!(pending.iter().all(|task| !task.completed), "{pending:?}");
    assert!(completed.iter().all(|task| task.completed), "{completed:?}");
    assert!(
        completed.iter().all(|task| !task.id.is_placeholder()),
        "placeholder in completed: {completed:?}"
    );

    let mut all: Vec<TaskId> = pending.iter().chain(&completed).map(|task| task.id).collect();
    let total = all.len();
    all.sort_unstable();
    all.dedup();
    assert_eq!(all.len(), total, "duplicate ids: {pending:?} / {completed:?}");
}
