//! # taskstore
//!
//! An optimistic task cache for interactive to-do front ends.
//!
//! ## Overview
//!
//! The store keeps tasks in two partitions (pending and completed) and lets
//! the presentation layer mutate them without waiting on storage:
//!
//! - **Optimistic mutations**: create, delete, toggle, and rename apply to the
//!   cache immediately and roll back exactly if persistence fails
//! - **Stale-while-revalidate refresh**: background fetches are merged with
//!   in-flight local changes instead of overwriting them
//! - **Epoch ordering**: a refresh superseded by a newer one is discarded
//! - **Pluggable collaborators**: a [`TaskService`](service::TaskService) for
//!   storage, a [`StoreObserver`](observer::StoreObserver) for notifications,
//!   and a [`Scheduler`](runtime::Scheduler) for running background jobs
//!
//! ## Feature Flags
//!
//! - `serde` (default): `Serialize`/`Deserialize` for the domain types and
//!   [`StoreSnapshot`]
//! - `demo`: builds the `taskstore-demo` binary
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use taskstore::prelude::*;
//!
//! let service = InMemoryTaskService::new();
//! let scheduler = Arc::new(QueueScheduler::new());
//! let store = TaskStore::new(
//!     Arc::new(service.clone()),
//!     Arc::new(TracingObserver),
//!     scheduler.clone(),
//! );
//!
//! let id = store.create_task("Buy milk").unwrap();
//! assert_eq!(store.pending_ids().iter().collect::<Vec<_>>(), vec![id]);
//!
//! scheduler.run_all();
//! assert_eq!(store.tasks(Partition::Pending)[0].id, TaskId::new(1));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
// Note: Disabling redundant_closure_for_method_calls due to clippy 0.1.92 panic bug
#![allow(clippy::redundant_closure_for_method_calls)]

/// Prelude module for convenient imports.
///
/// # Usage
///
/// ```rust
/// use taskstore::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::StoreConfig;
    pub use crate::domain::{Partition, PendingIds, Task, TaskId};
    pub use crate::error::{PersistenceError, RollbackError, ValidationError};
    pub use crate::observer::{CallbackObserver, StoreObserver, TracingObserver};
    pub use crate::runtime::{QueueScheduler, Scheduler, TokioScheduler};
    pub use crate::service::{InMemoryTaskService, TaskService};
    pub use crate::store::{AutoRefresh, StoreSnapshot, TaskStore};
}

pub mod config;
pub mod domain;
pub mod error;
pub mod observer;
pub mod runtime;
pub mod service;
pub mod store;

pub use store::{StoreSnapshot, TaskStore};
