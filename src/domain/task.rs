//! Task record, identifier, and partition key.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// =============================================================================
// TaskId
// =============================================================================

/// Identifier of a task.
///
/// Non-negative ids are assigned by the task service when a task is persisted.
/// Negative ids are placeholders minted by the store for tasks whose create
/// has not been confirmed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct TaskId(i64);

impl TaskId {
    /// Creates a `TaskId` from a raw integer.
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Returns the raw integer value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }

    /// Returns `true` if this id is a store-minted placeholder.
    #[must_use]
    pub const fn is_placeholder(self) -> bool {
        self.0 < 0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl From<i64> for TaskId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

// =============================================================================
// Partition
// =============================================================================

/// One of the two logical groupings of cached tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Partition {
    /// Incomplete tasks (`completed == false`).
    Pending,
    /// Completed tasks (`completed == true`).
    Completed,
}

impl Partition {
    /// Both partitions, pending first.
    pub const ALL: [Self; 2] = [Self::Pending, Self::Completed];

    /// Returns the partition holding tasks with the given `completed` value.
    #[must_use]
    pub const fn from_completed(completed: bool) -> Self {
        if completed {
            Self::Completed
        } else {
            Self::Pending
        }
    }

    /// Returns the `completed` value of tasks in this partition.
    #[must_use]
    pub const fn is_completed(self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Returns the other partition.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Pending => Self::Completed,
            Self::Completed => Self::Pending,
        }
    }

    /// Returns a stable slot index (`0` for pending, `1` for completed).
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Pending => 0,
            Self::Completed => 1,
        }
    }

    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }
}

impl From<bool> for Partition {
    fn from(completed: bool) -> Self {
        Self::from_completed(completed)
    }
}

impl std::fmt::Display for Partition {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

// =============================================================================
// Task
// =============================================================================

/// A cached task record.
///
/// Two tasks are equal when their `(id, subject, completed)` tuples are equal;
/// the store relies on this to decide whether a refresh changed anything.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Task {
    /// Task identifier.
    pub id: TaskId,
    /// Free-text subject.
    pub subject: String,
    /// Completion flag; decides the partition the task lives in.
    pub completed: bool,
}

impl Task {
    /// Creates a new task.
    #[must_use]
    pub fn new(id: impl Into<TaskId>, subject: impl Into<String>, completed: bool) -> Self {
        Self {
            id: id.into(),
            subject: subject.into(),
            completed,
        }
    }

    /// Returns the partition this task belongs in.
    #[must_use]
    pub const fn partition(&self) -> Partition {
        Partition::from_completed(self.completed)
    }
}
