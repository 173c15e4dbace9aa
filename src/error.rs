//! Error types.
//!
//! - [`ValidationError`]: rejected input, detected before any cache mutation
//! - [`PersistenceError`]: any failure reported by the task service
//! - [`RollbackError`]: a persistence failure paired with the mutation it undid;
//!   its display string is what observers receive through `on_error`
//! - [`CacheError`]: an initial cache the store refuses to start from

use thiserror::Error;

use crate::domain::TaskId;

// =============================================================================
// Validation
// =============================================================================

/// Input rejected before the store touches its cache.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The subject was empty after trimming.
    #[error("Task cannot be empty.")]
    EmptySubject,
}

/// Trims `subject` and rejects it if nothing is left.
///
/// # Errors
///
/// Returns [`ValidationError::EmptySubject`] if the trimmed subject is empty.
pub fn validate_subject(subject: &str) -> Result<&str, ValidationError> {
    let trimmed = subject.trim();
    if trimmed.is_empty() {
        Err(ValidationError::EmptySubject)
    } else {
        Ok(trimmed)
    }
}

// =============================================================================
// Persistence
// =============================================================================

/// Failure reported by a [`TaskService`](crate::service::TaskService).
///
/// The store treats every variant the same way: the affected mutation is
/// rolled back and reported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    /// The task does not exist in the backend.
    #[error("Task not found: {0}")]
    NotFound(TaskId),

    /// The backend rejected or failed the operation.
    #[error("Backend error: {0}")]
    Backend(String),

    /// The operation did not finish in time.
    #[error("Timed out after {millis}ms")]
    Timeout {
        /// Elapsed budget in milliseconds.
        millis: u64,
    },

    /// A failure produced by fail injection.
    #[error("Injected failure: {0}")]
    Injected(String),

    /// The backend answered with data the store cannot accept.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

// =============================================================================
// Initial Cache
// =============================================================================

/// A cache handed to [`TaskStore::with_cache`](crate::TaskStore::with_cache)
/// that the store cannot start from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// Only confirmed tasks may be seeded; placeholders are minted by the
    /// store itself.
    #[error("Task id must be positive, got {0}")]
    NonPositiveId(TaskId),

    /// The id appears more than once across both partitions.
    #[error("Task {0} appears more than once")]
    DuplicateId(TaskId),

    /// The task's `completed` flag does not match the partition holding it.
    #[error("Task {id} is filed under the wrong partition (completed = {completed})")]
    WrongPartition {
        /// The misfiled task.
        id: TaskId,
        /// Its `completed` flag.
        completed: bool,
    },
}

// =============================================================================
// Rollback
// =============================================================================

/// The four optimistic mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    /// `create_task`
    Create,
    /// `delete_task`
    Delete,
    /// `toggle_completed`
    Toggle,
    /// `update_subject`
    Rename,
}

impl MutationKind {
    /// User-facing message for a rolled back mutation of this kind.
    #[must_use]
    pub const fn rollback_message(self) -> &'static str {
        match self {
            Self::Create => "Create failed. Rolled back.",
            Self::Delete => "Delete failed. Rolled back.",
            Self::Toggle | Self::Rename => "Update failed. Rolled back.",
        }
    }

    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Delete => "delete",
            Self::Toggle => "toggle",
            Self::Rename => "rename",
        }
    }
}

/// A mutation that was undone because persistence failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} ({source})", .kind.rollback_message())]
pub struct RollbackError {
    /// Which mutation was rolled back.
    pub kind: MutationKind,
    /// The underlying service failure.
    #[source]
    pub source: PersistenceError,
}

impl RollbackError {
    /// Creates a new rollback error.
    #[must_use]
    pub const fn new(kind: MutationKind, source: PersistenceError) -> Self {
        Self { kind, source }
    }
}
