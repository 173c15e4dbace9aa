//! Property-based tests for `merge_with_local_overrides` and
//! `merge_both_partitions`.
//!
//! These tests verify that a merged fetch never contradicts the local state
//! the store is still waiting to persist.

use std::collections::{BTreeMap, BTreeSet};

use proptest::prelude::*;
use taskstore::domain::{Partition, PendingIds, Task, TaskId};
use taskstore::store::{
    MergeContext, TaskCache, merge_both_partitions, merge_with_local_overrides,
};

// =============================================================================
// Strategies
// =============================================================================

/// Server rows for one partition, newest (highest id) first.
fn fetched_strategy(partition: Partition) -> impl Strategy<Value = Vec<Task>> {
    prop::collection::btree_set(1i64..40, 0..15).prop_map(move |ids| {
        ids.into_iter()
            .rev()
            .map(|id| Task::new(id, format!("server {id}"), partition.is_completed()))
            .collect()
    })
}

/// A cache with disjoint partitions and `placeholders` unconfirmed creates on
/// top of the pending partition.
fn cache_strategy() -> impl Strategy<Value = TaskCache> {
    (
        prop::collection::btree_map(1i64..40, any::<bool>(), 0..20),
        0i64..4,
    )
        .prop_map(|(rows, placeholders): (BTreeMap<i64, bool>, i64)| {
            let mut pending: Vec<Task> = (1..=placeholders)
                .rev()
                .map(|n| Task::new(-n, format!("draft {n}"), false))
                .collect();
            let mut completed = Vec::new();
            for (id, done) in rows.into_iter().rev() {
                let task = Task::new(id, format!("local {id}"), done);
                if done {
                    completed.push(task);
                } else {
                    pending.push(task);
                }
            }
            TaskCache::from_parts(pending, completed)
        })
}

fn ids_strategy(max: usize) -> impl Strategy<Value = BTreeSet<i64>> {
    prop::collection::btree_set(1i64..40, 0..max)
}

fn partition_strategy() -> impl Strategy<Value = Partition> {
    prop_oneof![Just(Partition::Pending), Just(Partition::Completed)]
}

fn merge(
    partition: Partition,
    fetched: Vec<Task>,
    cache: &TaskCache,
    pending: &BTreeSet<i64>,
    deletes: &BTreeSet<i64>,
) -> Vec<Task> {
    let mut pending: PendingIds = pending.iter().copied().map(TaskId::new).collect();
    pending.extend(deletes.iter().copied().map(TaskId::new));
    pending.extend(cache.placeholders().map(|task| task.id));
    let deletes: PendingIds = deletes.iter().copied().map(TaskId::new).collect();
    merge_with_local_overrides(
        partition,
        fetched,
        MergeContext {
            cache,
            pending: &pending,
            pending_deletes: &deletes,
        },
    )
}

// =============================================================================
// Identity Law
// Description: Without local state the fetch is taken as is
// =============================================================================

proptest! {
    #[test]
    fn prop_identity_without_local_state(
        partition in partition_strategy(),
        fetched in fetched_strategy(Partition::Pending),
    ) {
        let fetched: Vec<Task> = fetched
            .into_iter()
            .map(|task| Task { completed: partition.is_completed(), ..task })
            .collect();
        let empty = BTreeSet::new();
        let merged = merge(partition, fetched.clone(), &TaskCache::new(), &empty, &empty);

        prop_assert_eq!(merged, fetched);
    }
}

// =============================================================================
// No Resurrection Law
// Description: An id whose delete is in flight never appears in a merge
// =============================================================================

proptest! {
    #[test]
    fn prop_pending_delete_is_never_resurrected(
        partition in partition_strategy(),
        fetched in fetched_strategy(Partition::Completed),
        cache in cache_strategy(),
        pending in ids_strategy(8),
        deletes in ids_strategy(6),
    ) {
        let merged = merge(partition, fetched, &cache, &pending, &deletes);

        for task in &merged {
            prop_assert!(!deletes.contains(&task.id.get()));
        }
    }
}

// =============================================================================
// Placeholder Confinement Law
// Description: Placeholders only appear in the pending partition, on top
// =============================================================================

proptest! {
    #[test]
    fn prop_placeholders_stay_on_top_of_pending(
        fetched_pending in fetched_strategy(Partition::Pending),
        fetched_completed in fetched_strategy(Partition::Completed),
        cache in cache_strategy(),
        pending in ids_strategy(8),
    ) {
        let empty = BTreeSet::new();
        let expected: Vec<Task> = cache.placeholders().cloned().collect();

        let merged_pending = merge(Partition::Pending, fetched_pending, &cache, &pending, &empty);
        let merged_completed =
            merge(Partition::Completed, fetched_completed, &cache, &pending, &empty);

        prop_assert_eq!(&merged_pending[..expected.len()], expected.as_slice());
        prop_assert!(merged_pending[expected.len()..].iter().all(|task| !task.id.is_placeholder()));
        prop_assert!(merged_completed.iter().all(|task| !task.id.is_placeholder()));
    }
}

// =============================================================================
// Local Override Law
// Description: A pending id keeps its local copy in its local partition only
// =============================================================================

proptest! {
    #[test]
    fn prop_pending_ids_keep_local_copy(
        partition in partition_strategy(),
        fetched in fetched_strategy(Partition::Pending),
        cache in cache_strategy(),
        pending in ids_strategy(10),
    ) {
        let empty = BTreeSet::new();
        let merged = merge(partition, fetched, &cache, &pending, &empty);

        for raw in &pending {
            let id = TaskId::new(*raw);
            let copies: Vec<&Task> = merged.iter().filter(|task| task.id == id).collect();
            match cache.locate(id) {
                Some((local_partition, index)) if local_partition == partition => {
                    prop_assert_eq!(copies, vec![&cache.tasks(partition)[index]]);
                }
                _ => {
                    prop_assert!(copies.is_empty());
                }
            }
        }
    }
}

// =============================================================================
// Exclusivity Law
// Description: A merge never duplicates ids or takes ids cached in the other
// partition
// =============================================================================

proptest! {
    #[test]
    fn prop_merge_respects_partition_exclusivity(
        partition in partition_strategy(),
        fetched in fetched_strategy(Partition::Pending),
        cache in cache_strategy(),
        pending in ids_strategy(8),
        deletes in ids_strategy(4),
    ) {
        let merged = merge(partition, fetched, &cache, &pending, &deletes);

        let unique: BTreeSet<TaskId> = merged.iter().map(|task| task.id).collect();
        prop_assert_eq!(unique.len(), merged.len());
        for task in &merged {
            prop_assert!(cache.position(partition.other(), task.id).is_none());
        }
    }
}

// =============================================================================
// Both Partitions Exclusivity Law
// Description: Reads of both partitions that disagree still yield disjoint
// lists, and an id read in one partition only is never lost
// =============================================================================

proptest! {
    #[test]
    fn prop_both_partitions_stay_disjoint(
        fetched_pending in fetched_strategy(Partition::Pending),
        fetched_completed in fetched_strategy(Partition::Completed),
        cache in cache_strategy(),
        pending in ids_strategy(6),
    ) {
        let mut pending_ids: PendingIds = pending.iter().copied().map(TaskId::new).collect();
        pending_ids.extend(cache.placeholders().map(|task| task.id));
        let deletes = PendingIds::new();
        let context = MergeContext {
            cache: &cache,
            pending: &pending_ids,
            pending_deletes: &deletes,
        };

        let read_pending: BTreeSet<i64> = fetched_pending.iter().map(|task| task.id.get()).collect();
        let read_completed: BTreeSet<i64> =
            fetched_completed.iter().map(|task| task.id.get()).collect();
        let [merged_pending, merged_completed] =
            merge_both_partitions([fetched_pending, fetched_completed], context);

        let in_pending: BTreeSet<i64> = merged_pending.iter().map(|task| task.id.get()).collect();
        let in_completed: BTreeSet<i64> =
            merged_completed.iter().map(|task| task.id.get()).collect();
        prop_assert_eq!(in_pending.len(), merged_pending.len());
        prop_assert_eq!(in_completed.len(), merged_completed.len());
        prop_assert!(in_pending.is_disjoint(&in_completed));

        for raw in read_pending.symmetric_difference(&read_completed) {
            if !pending.contains(raw) {
                prop_assert!(in_pending.contains(raw) || in_completed.contains(raw));
            }
        }
    }
}
