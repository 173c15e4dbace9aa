//! Stale-while-revalidate reconciliation of fetched tasks with local state.
//!
//! A fetched list is authoritative except where the store knows better:
//!
//! 1. ids whose delete is in flight are dropped, so they are not resurrected
//! 2. ids under any other in-flight mutation keep their local copy, placed at
//!    the front, and only in the partition the local copy lives in
//! 3. unconfirmed creates (placeholders) stay on top of the pending partition
//! 4. ids the cache holds in the other partition are dropped, so a snapshot
//!    taken before a settled move cannot duplicate the task
//!
//! Step 4 only applies when a single partition is fetched. When both
//! partitions are fetched together, [`merge_both_partitions`] applies steps 1
//! to 3 to each list and then files every id found in both lists under one
//! partition only. The two reads are separate calls, so a move can land
//! between them.

use std::collections::{HashMap, HashSet};

use crate::domain::{Partition, PendingIds, Task, TaskId};
use crate::store::TaskCache;

/// Local state a merge reads.
#[derive(Debug, Clone, Copy)]
pub struct MergeContext<'a> {
    /// Current cache contents.
    pub cache: &'a TaskCache,
    /// Ids under any in-flight mutation.
    pub pending: &'a PendingIds,
    /// Ids whose delete is in flight.
    pub pending_deletes: &'a PendingIds,
}

/// Merges a fetched list for `partition` with local overrides.
///
/// # Examples
///
/// ```rust
/// use taskstore::domain::{Partition, PendingIds, Task, TaskId};
/// use taskstore::store::{MergeContext, TaskCache, merge_with_local_overrides};
///
/// let cache = TaskCache::from_parts(vec![Task::new(-1, "draft", false)], Vec::new());
/// let pending: PendingIds = [TaskId::new(-1)].into_iter().collect();
/// let deletes = PendingIds::new();
/// let context = MergeContext { cache: &cache, pending: &pending, pending_deletes: &deletes };
///
/// let merged = merge_with_local_overrides(
///     Partition::Pending,
///     vec![Task::new(5, "from server", false)],
///     context,
/// );
/// let ids: Vec<i64> = merged.iter().map(|task| task.id.get()).collect();
/// assert_eq!(ids, vec![-1, 5]);
/// ```
#[must_use]
pub fn merge_with_local_overrides(
    partition: Partition,
    fetched: Vec<Task>,
    context: MergeContext<'_>,
) -> Vec<Task> {
    let mut tasks = overlay_local_state(partition, fetched, context);
    let other = partition.other();
    tasks.retain(|task| {
        task.id.is_placeholder() || context.cache.position(other, task.id).is_none()
    });
    tasks
}

/// Merges fetched lists for both partitions, pending first.
///
/// Each list is overlaid with local state. An id present in both results
/// stays in the pending list only while the cache holds it there; otherwise
/// the completed copy is kept. Ids found in one list only are left alone, so
/// a task moved by another client moves instead of vanishing.
#[must_use]
pub fn merge_both_partitions(
    fetched: [Vec<Task>; 2],
    context: MergeContext<'_>,
) -> [Vec<Task>; 2] {
    let [pending, completed] = fetched;
    let mut pending = overlay_local_state(Partition::Pending, pending, context);
    let mut completed = overlay_local_state(Partition::Completed, completed, context);

    let completed_ids: HashSet<TaskId> = completed.iter().map(|task| task.id).collect();
    let overlapping: HashSet<TaskId> = pending
        .iter()
        .map(|task| task.id)
        .filter(|id| completed_ids.contains(id))
        .collect();

    if !overlapping.is_empty() {
        let cached_as_pending =
            |id: TaskId| context.cache.position(Partition::Pending, id).is_some();
        pending.retain(|task| !overlapping.contains(&task.id) || cached_as_pending(task.id));
        completed.retain(|task| !overlapping.contains(&task.id) || !cached_as_pending(task.id));
    }

    [pending, completed]
}

/// Applies pending deletes, pending overrides, and placeholders to a fetched
/// list, without checking the other partition.
#[must_use]
pub fn overlay_local_state(
    partition: Partition,
    fetched: Vec<Task>,
    context: MergeContext<'_>,
) -> Vec<Task> {
    let MergeContext {
        cache,
        pending,
        pending_deletes,
    } = context;

    let mut tasks: Vec<Task> = fetched
        .into_iter()
        .filter(|task| !pending_deletes.contains(task.id))
        .collect();

    let overridden: Vec<TaskId> = pending
        .iter()
        .filter(|id| !id.is_placeholder() && !pending_deletes.contains(*id))
        .collect();

    if !overridden.is_empty() {
        let local_by_id: HashMap<TaskId, &Task> = cache
            .iter()
            .filter(|task| !task.id.is_placeholder())
            .map(|task| (task.id, task))
            .collect();

        tasks.retain(|task| !overridden.contains(&task.id));
        for id in overridden {
            if let Some(local) = local_by_id.get(&id)
                && local.partition() == partition
            {
                tasks.insert(0, (*local).clone());
            }
        }
    }

    if partition == Partition::Pending {
        let mut placeholders: Vec<Task> = cache.placeholders().cloned().collect();
        if !placeholders.is_empty() {
            placeholders.append(&mut tasks);
            tasks = placeholders;
        }
    }

    tasks
}
