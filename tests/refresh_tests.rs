//! Stale-while-revalidate refresh behavior.

mod common;

use common::{Harness, assert_partitions_consistent};
use rstest::rstest;
use taskstore::domain::{Partition, Task, TaskId};
use taskstore::service::ServiceOperation;

// =============================================================================
// Merge With In-Flight Mutations
// =============================================================================

#[rstest]
fn test_refresh_keeps_in_flight_rename() {
    let harness = Harness::seeded(&[("one", false), ("two", false)]);

    harness.store.update_subject(TaskId::new(1), "uno").unwrap();
    harness.store.refresh_partition(Partition::Pending);
    assert!(harness.scheduler.run_newest());

    let pending = harness.store.tasks(Partition::Pending);
    assert_eq!(pending[0], Task::new(1, "uno", false));
    assert_eq!(pending[1], Task::new(2, "two", false));

    harness.scheduler.run_all();
    assert!(harness.store.pending_ids().is_empty());
    assert!(harness.store.tasks(Partition::Pending).contains(&Task::new(1, "uno", false)));
}

#[rstest]
fn test_refresh_does_not_resurrect_pending_delete() {
    let harness = Harness::seeded(&[("one", false), ("two", false)]);

    assert!(harness.store.delete_task(TaskId::new(2)));
    harness.store.refresh_partition(Partition::Pending);
    assert!(harness.scheduler.run_newest());

    assert_eq!(harness.ids(Partition::Pending), vec![1]);
    assert!(harness.store.pending_delete_ids().contains(TaskId::new(2)));
}

#[rstest]
fn test_refresh_keeps_placeholders_on_top() {
    let harness = Harness::seeded(&[("one", false)]);

    let placeholder = harness.store.create_task("draft").unwrap();
    harness.service.seed("from elsewhere", false);
    harness.store.refresh_partition(Partition::Pending);
    assert!(harness.scheduler.run_newest());

    assert_eq!(harness.ids(Partition::Pending), vec![placeholder.get(), 2, 1]);

    harness.scheduler.run_all();
    assert_eq!(harness.ids(Partition::Pending), vec![3, 2, 1]);
}

#[rstest]
fn test_refresh_of_destination_keeps_in_flight_toggle() {
    let harness = Harness::seeded(&[("one", false), ("two", true)]);

    assert!(harness.store.toggle_completed(TaskId::new(1), true));
    harness.store.refresh_partition(Partition::Completed);
    harness.store.refresh_partition(Partition::Pending);
    assert!(harness.scheduler.run_newest());
    assert!(harness.scheduler.run_newest());

    assert_eq!(harness.ids(Partition::Completed), vec![1, 2]);
    assert!(harness.ids(Partition::Pending).is_empty());
    assert_partitions_consistent(&harness.store);
}

// =============================================================================
// Failures
// =============================================================================

#[rstest]
fn test_refresh_failure_keeps_stale_cache_silently() {
    let harness = Harness::seeded(&[("one", false)]);
    harness.service.seed("two", false);
    harness.service.fail_next(ServiceOperation::GetTasks);
    let baseline = harness.observer.changes();

    harness.store.refresh_partition(Partition::Pending);
    assert!(harness.store.is_refreshing(Partition::Pending));
    harness.scheduler.run_all();

    assert_eq!(harness.ids(Partition::Pending), vec![1]);
    assert!(!harness.store.is_refreshing(Partition::Pending));
    assert!(harness.observer.errors().is_empty());
    assert_eq!(harness.observer.changes(), baseline + 2);
}

#[rstest]
fn test_warm_applies_nothing_when_one_fetch_fails() {
    let harness = Harness::new();
    harness.service.seed("one", false);
    harness.service.seed("two", true);
    harness.service.fail_next(ServiceOperation::GetTasks);

    harness.store.warm_cache_both();
    harness.scheduler.run_all();

    assert!(harness.store.tasks(Partition::Pending).is_empty());
    assert!(harness.store.tasks(Partition::Completed).is_empty());
    assert!(!harness.store.is_refreshing(Partition::Pending));
    assert!(!harness.store.is_refreshing(Partition::Completed));
    assert!(harness.observer.errors().is_empty());
}

// =============================================================================
// Epochs
// =============================================================================

#[rstest]
fn test_warm_is_discarded_when_a_partition_was_refreshed_again() {
    let harness = Harness::new();
    harness.service.seed("one", false);
    harness.service.seed("two", true);

    harness.store.warm_cache_both();
    harness.store.refresh_partition(Partition::Completed);

    assert!(harness.scheduler.run_next());
    assert!(harness.store.tasks(Partition::Pending).is_empty());
    assert!(harness.store.tasks(Partition::Completed).is_empty());
    assert!(!harness.store.is_refreshing(Partition::Pending));
    assert!(harness.store.is_refreshing(Partition::Completed));

    assert!(harness.scheduler.run_next());
    assert_eq!(harness.ids(Partition::Completed), vec![2]);
    assert!(!harness.store.is_refreshing(Partition::Completed));
}

#[rstest]
fn test_stale_refresh_does_not_notify() {
    let harness = Harness::seeded(&[("one", false)]);

    harness.store.refresh_partition(Partition::Completed);
    harness.store.refresh_partition(Partition::Completed);
    assert!(harness.scheduler.run_newest());
    let settled = harness.observer.changes();

    assert!(harness.scheduler.run_next());
    assert_eq!(harness.observer.changes(), settled);
}

#[rstest]
#[case(Partition::Pending)]
#[case(Partition::Completed)]
fn test_refreshing_flag_spans_the_fetch(#[case] partition: Partition) {
    let harness = Harness::new();
    assert!(!harness.store.is_refreshing(partition));

    harness.store.refresh_partition(partition);
    assert!(harness.store.is_refreshing(partition));
    assert!(!harness.store.is_refreshing(partition.other()));

    harness.scheduler.run_all();
    assert!(!harness.store.is_refreshing(partition));
}

#[rstest]
fn test_snapshot_reports_flags_and_pending_ids() {
    let harness = Harness::seeded(&[("one", false), ("two", true)]);

    harness.store.toggle_completed(TaskId::new(2), false);
    harness.store.refresh_partition(Partition::Completed);
    let snapshot = harness.store.snapshot();

    assert_eq!(snapshot.pending_ids, vec![TaskId::new(2)]);
    assert!(!snapshot.refreshing_pending);
    assert!(snapshot.refreshing_completed);
    assert_eq!(snapshot.tasks(Partition::Pending)[0].id, TaskId::new(2));
    assert!(snapshot.completed.is_empty());
}

#[cfg(feature = "serde")]
#[rstest]
fn test_snapshot_serializes_to_json() {
    let harness = Harness::seeded(&[("one", false)]);

    let json = serde_json::to_value(harness.store.snapshot()).unwrap();

    assert_eq!(json["pending"][0]["subject"], "one");
    assert_eq!(json["pending"][0]["id"], 1);
    assert_eq!(json["refreshing_pending"], false);
}
