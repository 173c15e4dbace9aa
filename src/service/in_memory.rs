//! In-memory task service.
//!
//! [`InMemoryTaskService`] is a complete [`TaskService`] backed by a vector of
//! rows. It is used by the demo binary and the test suite.
//!
//! # Features
//!
//! - Thread-safe with `Arc<Mutex<...>>`, cheap to clone (clones share state)
//! - Ids assigned from 1 upwards, `get_tasks` newest first
//! - Every call is recorded when its future is first polled
//! - One-shot scripted failures per operation ([`InMemoryTaskService::fail_next`])
//! - Optional randomized fail injection ([`FailInjectionConfig`])

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use futures::FutureExt;
use parking_lot::Mutex;

use super::fail_injection::{FailInjectionConfig, FailInjector, Injection};
use super::{PersistFuture, TaskService};
use crate::domain::{Partition, Task, TaskId};
use crate::error::{PersistenceError, validate_subject};

// =============================================================================
// Call Log
// =============================================================================

/// The five service operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceOperation {
    /// `add_task`
    AddTask,
    /// `get_tasks`
    GetTasks,
    /// `toggle_completed`
    ToggleCompleted,
    /// `update_subject`
    UpdateSubject,
    /// `delete_task`
    DeleteTask,
}

impl ServiceOperation {
    const fn as_str(self) -> &'static str {
        match self {
            Self::AddTask => "add_task",
            Self::GetTasks => "get_tasks",
            Self::ToggleCompleted => "toggle_completed",
            Self::UpdateSubject => "update_subject",
            Self::DeleteTask => "delete_task",
        }
    }
}

/// One recorded service call with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceCall {
    /// `add_task(subject)`
    AddTask {
        /// Requested subject.
        subject: String,
    },
    /// `get_tasks(partition)`
    GetTasks {
        /// Requested partition.
        partition: Partition,
    },
    /// `toggle_completed(id, completed)`
    ToggleCompleted {
        /// Target task.
        id: TaskId,
        /// Requested flag.
        completed: bool,
    },
    /// `update_subject(id, subject)`
    UpdateSubject {
        /// Target task.
        id: TaskId,
        /// Requested subject.
        subject: String,
    },
    /// `delete_task(id)`
    DeleteTask {
        /// Target task.
        id: TaskId,
    },
}

impl ServiceCall {
    /// Returns the operation this call invoked.
    #[must_use]
    pub const fn operation(&self) -> ServiceOperation {
        match self {
            Self::AddTask { .. } => ServiceOperation::AddTask,
            Self::GetTasks { .. } => ServiceOperation::GetTasks,
            Self::ToggleCompleted { .. } => ServiceOperation::ToggleCompleted,
            Self::UpdateSubject { .. } => ServiceOperation::UpdateSubject,
            Self::DeleteTask { .. } => ServiceOperation::DeleteTask,
        }
    }
}

// =============================================================================
// Backend
// =============================================================================

#[derive(Debug, Default)]
struct Backend {
    /// Oldest first.
    rows: Vec<Task>,
    last_id: i64,
    calls: Vec<ServiceCall>,
    scripted: HashMap<ServiceOperation, VecDeque<PersistenceError>>,
}

impl Backend {
    /// Logs the call and pops a scripted failure for its operation, if any.
    fn record(&mut self, call: ServiceCall) -> Result<(), PersistenceError> {
        let operation = call.operation();
        self.calls.push(call);
        match self
            .scripted
            .get_mut(&operation)
            .and_then(VecDeque::pop_front)
        {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn insert(&mut self, subject: &str, completed: bool) -> Task {
        self.last_id += 1;
        let task = Task::new(self.last_id, subject, completed);
        self.rows.push(task.clone());
        task
    }

    fn position(&self, id: TaskId) -> Result<usize, PersistenceError> {
        self.rows
            .iter()
            .position(|task| task.id == id)
            .ok_or(PersistenceError::NotFound(id))
    }

    fn list(&self, partition: Partition) -> Vec<Task> {
        self.rows
            .iter()
            .rev()
            .filter(|task| task.partition() == partition)
            .cloned()
            .collect()
    }

    fn add_task(&mut self, subject: String) -> Result<Task, PersistenceError> {
        self.record(ServiceCall::AddTask {
            subject: subject.clone(),
        })?;
        let subject = validate_subject(&subject)
            .map_err(|error| PersistenceError::Backend(error.to_string()))?;
        Ok(self.insert(subject, false))
    }

    fn get_tasks(&mut self, partition: Partition) -> Result<Vec<Task>, PersistenceError> {
        self.record(ServiceCall::GetTasks { partition })?;
        Ok(self.list(partition))
    }

    fn toggle_completed(&mut self, id: TaskId, completed: bool) -> Result<(), PersistenceError> {
        self.record(ServiceCall::ToggleCompleted { id, completed })?;
        let position = self.position(id)?;
        self.rows[position].completed = completed;
        Ok(())
    }

    fn update_subject(&mut self, id: TaskId, subject: String) -> Result<(), PersistenceError> {
        self.record(ServiceCall::UpdateSubject {
            id,
            subject: subject.clone(),
        })?;
        let subject = validate_subject(&subject)
            .map_err(|error| PersistenceError::Backend(error.to_string()))?;
        let position = self.position(id)?;
        self.rows[position].subject = subject.to_string();
        Ok(())
    }

    fn delete_task(&mut self, id: TaskId) -> Result<(), PersistenceError> {
        self.record(ServiceCall::DeleteTask { id })?;
        let position = self.position(id)?;
        self.rows.remove(position);
        Ok(())
    }
}

// =============================================================================
// In-Memory Task Service
// =============================================================================

/// In-memory implementation of [`TaskService`].
///
/// # Example
///
/// ```rust
/// use taskstore::domain::Partition;
/// use taskstore::service::{InMemoryTaskService, ServiceOperation};
///
/// let service = InMemoryTaskService::new();
/// let first = service.seed("Water plants", false);
/// service.seed("File taxes", true);
///
/// assert_eq!(first.id.get(), 1);
/// assert_eq!(service.stored(Partition::Pending), vec![first]);
///
/// service.fail_next(ServiceOperation::DeleteTask);
/// ```
#[derive(Debug, Clone)]
pub struct InMemoryTaskService {
    backend: Arc<Mutex<Backend>>,
    injector: Arc<Mutex<FailInjector>>,
}

impl InMemoryTaskService {
    /// Creates an empty service without fail injection.
    #[must_use]
    pub fn new() -> Self {
        Self::with_fail_injection(FailInjectionConfig::default())
    }

    /// Creates an empty service with randomized fail injection.
    #[must_use]
    pub fn with_fail_injection(config: FailInjectionConfig) -> Self {
        Self {
            backend: Arc::new(Mutex::new(Backend::default())),
            injector: Arc::new(Mutex::new(FailInjector::new(config))),
        }
    }

    /// Inserts a task directly, bypassing the call log and fail injection.
    pub fn seed(&self, subject: &str, completed: bool) -> Task {
        self.backend.lock().insert(subject, completed)
    }

    /// Returns the stored tasks of a partition, newest first.
    #[must_use]
    pub fn stored(&self, partition: Partition) -> Vec<Task> {
        self.backend.lock().list(partition)
    }

    /// Makes the next call of `operation` fail with a backend error.
    ///
    /// Scripted failures are consumed in order, one per call, and fire before
    /// the operation touches the stored rows.
    pub fn fail_next(&self, operation: ServiceOperation) {
        self.fail_next_with(
            operation,
            PersistenceError::Backend(format!("scripted {} failure", operation.as_str())),
        );
    }

    /// Makes the next call of `operation` fail with `error`.
    pub fn fail_next_with(&self, operation: ServiceOperation, error: PersistenceError) {
        self.backend
            .lock()
            .scripted
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    /// Returns every recorded call, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<ServiceCall> {
        self.backend.lock().calls.clone()
    }

    /// Returns how many calls of `operation` were recorded.
    #[must_use]
    pub fn call_count(&self, operation: ServiceOperation) -> usize {
        self.backend
            .lock()
            .calls
            .iter()
            .filter(|call| call.operation() == operation)
            .count()
    }

    /// Runs `apply` against the backend, then applies fail injection.
    fn run<T, F>(&self, operation: ServiceOperation, apply: F) -> PersistFuture<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Backend) -> Result<T, PersistenceError> + Send + 'static,
    {
        let backend = Arc::clone(&self.backend);
        let injector = Arc::clone(&self.injector);
        async move {
            let result = apply(&mut *backend.lock());
            let Injection { delay, failure } = injector.lock().draw(operation.as_str());
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            match failure {
                Some(error) => {
                    tracing::debug!(operation = operation.as_str(), %error, "service.injected_failure");
                    Err(error)
                }
                None => result,
            }
        }
        .boxed()
    }
}

impl Default for InMemoryTaskService {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskService for InMemoryTaskService {
    fn add_task(&self, subject: String) -> PersistFuture<Task> {
        self.run(ServiceOperation::AddTask, move |backend| {
            backend.add_task(subject)
        })
    }

    fn get_tasks(&self, partition: Partition) -> PersistFuture<Vec<Task>> {
        self.run(ServiceOperation::GetTasks, move |backend| {
            backend.get_tasks(partition)
        })
    }

    fn toggle_completed(&self, id: TaskId, completed: bool) -> PersistFuture<()> {
        self.run(ServiceOperation::ToggleCompleted, move |backend| {
            backend.toggle_completed(id, completed)
        })
    }

    fn update_subject(&self, id: TaskId, subject: String) -> PersistFuture<()> {
        self.run(ServiceOperation::UpdateSubject, move |backend| {
            backend.update_subject(id, subject)
        })
    }

    fn delete_task(&self, id: TaskId) -> PersistFuture<()> {
        self.run(ServiceOperation::DeleteTask, move |backend| {
            backend.delete_task(id)
        })
    }
}
