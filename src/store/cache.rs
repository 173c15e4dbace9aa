//! Two-partition task cache.

use std::collections::HashSet;

use crate::domain::{Partition, Task, TaskId};
use crate::error::CacheError;

/// Ordered task lists, one per partition, newest first by insertion.
///
/// Lookups are linear scans; the cache holds what one screen shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskCache {
    partitions: [Vec<Task>; 2],
}

impl TaskCache {
    /// Creates an empty cache.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            partitions: [Vec::new(), Vec::new()],
        }
    }

    /// Creates a cache from the contents of both partitions.
    #[must_use]
    pub const fn from_parts(pending: Vec<Task>, completed: Vec<Task>) -> Self {
        Self {
            partitions: [pending, completed],
        }
    }

    /// Returns the tasks of a partition.
    #[must_use]
    pub fn tasks(&self, partition: Partition) -> &[Task] {
        &self.partitions[partition.index()]
    }

    pub(crate) fn tasks_mut(&mut self, partition: Partition) -> &mut Vec<Task> {
        &mut self.partitions[partition.index()]
    }

    /// Replaces the tasks of a partition.
    pub(crate) fn replace(&mut self, partition: Partition, tasks: Vec<Task>) {
        self.partitions[partition.index()] = tasks;
    }

    /// Returns the partition and index of `id`, searching pending first.
    #[must_use]
    pub fn locate(&self, id: TaskId) -> Option<(Partition, usize)> {
        Partition::ALL.into_iter().find_map(|partition| {
            self.position(partition, id)
                .map(|index| (partition, index))
        })
    }

    /// Returns the index of `id` within one partition.
    #[must_use]
    pub fn position(&self, partition: Partition, id: TaskId) -> Option<usize> {
        self.tasks(partition).iter().position(|task| task.id == id)
    }

    /// Returns the task with `id` from either partition.
    #[must_use]
    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.locate(id)
            .map(|(partition, index)| &self.tasks(partition)[index])
    }

    pub(crate) fn get_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        let (partition, index) = self.locate(id)?;
        Some(&mut self.tasks_mut(partition)[index])
    }

    /// Removes and returns the task at `index` of a partition.
    pub(crate) fn remove_at(&mut self, partition: Partition, index: usize) -> Task {
        self.tasks_mut(partition).remove(index)
    }

    /// Removes the task with `id` from one partition, if present.
    pub(crate) fn remove_from(&mut self, partition: Partition, id: TaskId) -> Option<Task> {
        let index = self.position(partition, id)?;
        Some(self.remove_at(partition, index))
    }

    /// Inserts at the front of a partition.
    pub(crate) fn push_front(&mut self, partition: Partition, task: Task) {
        self.tasks_mut(partition).insert(0, task);
    }

    /// Inserts at `min(index, len)` of a partition.
    pub(crate) fn insert_clamped(&mut self, partition: Partition, index: usize, task: Task) {
        let tasks = self.tasks_mut(partition);
        let index = index.min(tasks.len());
        tasks.insert(index, task);
    }

    /// Returns the placeholders of the pending partition in cache order.
    pub fn placeholders(&self) -> impl Iterator<Item = &Task> {
        self.tasks(Partition::Pending)
            .iter()
            .filter(|task| task.id.is_placeholder())
    }

    /// Iterates over both partitions, pending first.
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.partitions.iter().flatten()
    }

    /// Checks that the cache only holds confirmed tasks, each once, filed
    /// under the partition its `completed` flag names.
    ///
    /// # Errors
    ///
    /// Returns the first [`CacheError`] found, pending partition first.
    pub fn validate(&self) -> Result<(), CacheError> {
        let mut seen = HashSet::new();
        for partition in Partition::ALL {
            for task in self.tasks(partition) {
                if task.id.get() <= 0 {
                    return Err(CacheError::NonPositiveId(task.id));
                }
                if task.partition() != partition {
                    return Err(CacheError::WrongPartition {
                        id: task.id,
                        completed: task.completed,
                    });
                }
                if !seen.insert(task.id) {
                    return Err(CacheError::DuplicateId(task.id));
                }
            }
        }
        Ok(())
    }
}
