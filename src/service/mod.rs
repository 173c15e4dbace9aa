//! The task service contract and a reference implementation.
//!
//! The store never talks to storage directly. It consumes a [`TaskService`]
//! whose methods return deferred futures: nothing should happen until the
//! returned future is polled, because the store creates these futures inside
//! the jobs it hands to its [`Scheduler`](crate::runtime::Scheduler).

pub mod fail_injection;
pub mod in_memory;

use futures::future::BoxFuture;

use crate::domain::{Partition, Task, TaskId};
use crate::error::PersistenceError;

pub use fail_injection::FailInjectionConfig;
pub use in_memory::{InMemoryTaskService, ServiceCall, ServiceOperation};

/// Deferred result of a persistence call.
pub type PersistFuture<T> = BoxFuture<'static, Result<T, PersistenceError>>;

/// Durable CRUD for tasks.
///
/// Implementations decide their own timeout policy; the store treats every
/// error the same way (rollback and report).
///
/// # Example
///
/// ```rust
/// use futures::FutureExt;
/// use taskstore::domain::{Partition, Task, TaskId};
/// use taskstore::service::{PersistFuture, TaskService};
///
/// struct Offline;
///
/// impl TaskService for Offline {
///     fn add_task(&self, subject: String) -> PersistFuture<Task> {
///         async move { Ok(Task::new(1, subject, false)) }.boxed()
///     }
///     fn get_tasks(&self, _partition: Partition) -> PersistFuture<Vec<Task>> {
///         async { Ok(Vec::new()) }.boxed()
///     }
///     fn toggle_completed(&self, _id: TaskId, _completed: bool) -> PersistFuture<()> {
///         async { Ok(()) }.boxed()
///     }
///     fn update_subject(&self, _id: TaskId, _subject: String) -> PersistFuture<()> {
///         async { Ok(()) }.boxed()
///     }
///     fn delete_task(&self, _id: TaskId) -> PersistFuture<()> {
///         async { Ok(()) }.boxed()
///     }
/// }
/// ```
pub trait TaskService: Send + Sync {
    /// Persists a new task and returns it with its assigned id.
    fn add_task(&self, subject: String) -> PersistFuture<Task>;

    /// Returns every task of a partition, newest first.
    fn get_tasks(&self, partition: Partition) -> PersistFuture<Vec<Task>>;

    /// Sets the completion flag of a task.
    fn toggle_completed(&self, id: TaskId, completed: bool) -> PersistFuture<()>;

    /// Replaces the subject of a task.
    fn update_subject(&self, id: TaskId, subject: String) -> PersistFuture<()>;

    /// Deletes a task.
    fn delete_task(&self, id: TaskId) -> PersistFuture<()>;
}
