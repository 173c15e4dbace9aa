//! End-to-end scenarios for the optimistic mutation flow.
//!
//! Each test drives a `TaskStore` with a `QueueScheduler`, so the moment a
//! persistence call completes is chosen by the test.

mod common;

use common::{Harness, assert_partitions_consistent};
use rstest::rstest;
use taskstore::domain::{Partition, Task, TaskId};
use taskstore::error::ValidationError;
use taskstore::service::{ServiceCall, ServiceOperation};

// =============================================================================
// Scenario A: create
// =============================================================================

#[rstest]
fn test_create_shows_placeholder_then_confirmed_task() {
    let harness = Harness::new();
    for index in 0..41 {
        harness.service.seed(&format!("archived {index}"), true);
    }

    let placeholder = harness.store.create_task("Buy milk").unwrap();

    let pending = harness.store.tasks(Partition::Pending);
    assert!(pending[0].id.is_placeholder());
    assert_eq!(pending[0].id, placeholder);
    assert_eq!(pending[0].subject, "Buy milk");
    assert_eq!(harness.pending_ids(), vec![placeholder.get()]);

    harness.scheduler.run_all();

    assert_eq!(
        harness.store.tasks(Partition::Pending)[0],
        Task::new(42, "Buy milk", false)
    );
    assert!(harness.store.pending_ids().is_empty());
}

#[rstest]
fn test_create_keeps_position_when_other_tasks_arrive_first() {
    let harness = Harness::seeded(&[("one", false)]);

    let first = harness.store.create_task("first").unwrap();
    let second = harness.store.create_task("second").unwrap();
    assert_eq!(harness.ids(Partition::Pending), vec![second.get(), first.get(), 1]);

    assert!(harness.scheduler.run_newest());
    assert_eq!(harness.ids(Partition::Pending), vec![2, first.get(), 1]);

    assert!(harness.scheduler.run_next());
    assert_eq!(harness.ids(Partition::Pending), vec![2, 3, 1]);
    assert_eq!(harness.store.tasks(Partition::Pending)[0].subject, "second");
}

#[rstest]
fn test_create_trims_title() {
    let harness = Harness::new();
    harness.store.create_task("  Buy milk \n").unwrap();
    harness.scheduler.run_all();

    assert_eq!(
        harness.service.calls(),
        vec![ServiceCall::AddTask {
            subject: "Buy milk".to_string()
        }]
    );
}

#[rstest]
#[case("")]
#[case("    ")]
#[case("\t\n")]
fn test_create_with_empty_title_is_rejected(#[case] title: &str) {
    let harness = Harness::new();

    let result = harness.store.create_task(title);

    assert_eq!(result, Err(ValidationError::EmptySubject));
    assert_eq!(harness.observer.errors(), vec!["Task cannot be empty."]);
    assert_eq!(harness.observer.changes(), 0);
    assert!(harness.store.tasks(Partition::Pending).is_empty());
    assert!(harness.scheduler.is_empty());
}

#[rstest]
fn test_create_failure_removes_placeholder_and_reports() {
    let harness = Harness::seeded(&[("one", false)]);
    let before = harness.store.tasks(Partition::Pending);
    harness.service.fail_next(ServiceOperation::AddTask);

    harness.store.create_task("doomed").unwrap();
    harness.scheduler.run_all();

    assert_eq!(harness.store.tasks(Partition::Pending), before);
    assert!(harness.store.pending_ids().is_empty());
    assert_eq!(
        harness.observer.errors(),
        vec!["Create failed. Rolled back. (Backend error: scripted add_task failure)"]
    );
}

// =============================================================================
// Scenario B: toggle
// =============================================================================

#[rstest]
fn test_toggle_failure_restores_original_index() {
    let harness = Harness::with_cache(
        vec![
            Task::new(5, "five", false),
            Task::new(3, "three", false),
            Task::new(1, "one", false),
        ],
        vec![Task::new(2, "two", true)],
    );
    harness.service.fail_next(ServiceOperation::ToggleCompleted);

    assert!(harness.store.toggle_completed(TaskId::new(3), true));
    assert_eq!(harness.ids(Partition::Completed), vec![3, 2]);
    assert_eq!(harness.ids(Partition::Pending), vec![5, 1]);
    assert!(harness.store.tasks(Partition::Completed)[0].completed);

    harness.scheduler.run_all();

    assert_eq!(harness.ids(Partition::Pending), vec![5, 3, 1]);
    assert_eq!(harness.store.tasks(Partition::Pending)[1], Task::new(3, "three", false));
    assert_eq!(harness.ids(Partition::Completed), vec![2]);
    let errors = harness.observer.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("Rolled back"), "{errors:?}");
    assert!(harness.store.pending_ids().is_empty());
}

#[rstest]
fn test_toggle_success_keeps_task_at_front_of_destination() {
    let harness = Harness::seeded(&[("one", false), ("two", true), ("three", false)]);

    assert!(harness.store.toggle_completed(TaskId::new(1), true));
    harness.scheduler.run_all();

    assert_eq!(harness.ids(Partition::Completed), vec![1, 2]);
    assert_eq!(harness.ids(Partition::Pending), vec![3]);
    assert!(harness.observer.errors().is_empty());
    assert_eq!(harness.service.stored(Partition::Completed).len(), 2);
    assert_partitions_consistent(&harness.store);
}

// =============================================================================
// Scenario C: delete
// =============================================================================

#[rstest]
fn test_delete_failure_reinserts_at_original_index() {
    let harness = Harness::with_cache(
        vec![
            Task::new(9, "nine", false),
            Task::new(8, "eight", false),
            Task::new(7, "seven", false),
            Task::new(6, "six", false),
        ],
        Vec::new(),
    );
    let before = harness.store.tasks(Partition::Pending);
    harness.service.fail_next(ServiceOperation::DeleteTask);

    assert!(harness.store.delete_task(TaskId::new(7)));
    assert_eq!(harness.ids(Partition::Pending), vec![9, 8, 6]);
    assert!(harness.store.pending_delete_ids().contains(TaskId::new(7)));

    harness.scheduler.run_all();

    assert_eq!(harness.store.tasks(Partition::Pending), before);
    assert!(harness.observer.errors()[0].contains("Rolled back"));
    assert!(!harness.store.pending_ids().contains(TaskId::new(7)));
    assert!(!harness.store.pending_delete_ids().contains(TaskId::new(7)));
}

#[rstest]
fn test_delete_success_removes_from_service() {
    let harness = Harness::seeded(&[("one", false), ("two", true)]);

    assert!(harness.store.delete_task(TaskId::new(2)));
    harness.scheduler.run_all();

    assert!(harness.store.tasks(Partition::Completed).is_empty());
    assert!(harness.service.stored(Partition::Completed).is_empty());
    assert!(harness.store.pending_delete_ids().is_empty());
}

// =============================================================================
// Scenario D: overlapping refreshes
// =============================================================================

#[rstest]
fn test_only_latest_refresh_is_applied() {
    let harness = Harness::seeded(&[("one", false)]);

    harness.store.refresh_partition(Partition::Pending);
    harness.store.refresh_partition(Partition::Pending);

    harness.service.seed("two", false);
    assert!(harness.scheduler.run_newest());
    assert_eq!(harness.ids(Partition::Pending), vec![2, 1]);
    assert!(!harness.store.is_refreshing(Partition::Pending));

    harness.service.seed("three", false);
    assert!(harness.scheduler.run_next());
    assert_eq!(harness.ids(Partition::Pending), vec![2, 1]);
    assert!(!harness.store.is_refreshing(Partition::Pending));
}

// =============================================================================
// Notifications
// =============================================================================

#[rstest]
fn test_each_mutation_notifies_on_start_and_on_settle() {
    let harness = Harness::seeded(&[("one", false), ("two", false)]);
    let baseline = harness.observer.changes();

    harness.store.create_task("three").unwrap();
    harness.store.toggle_completed(TaskId::new(1), true);
    harness.store.update_subject(TaskId::new(2), "deux").unwrap();
    assert_eq!(harness.observer.changes(), baseline + 3);

    harness.scheduler.run_all();
    assert_eq!(harness.observer.changes(), baseline + 6);
}

#[rstest]
fn test_ignored_mutations_do_not_notify_or_call_service() {
    let harness = Harness::seeded(&[("one", false)]);
    let baseline = harness.observer.changes();
    let calls = harness.service.calls().len();

    assert!(!harness.store.delete_task(TaskId::new(99)));
    assert!(!harness.store.toggle_completed(TaskId::new(1), false));
    assert_eq!(harness.store.update_subject(TaskId::new(1), " one "), Ok(false));

    assert_eq!(harness.observer.changes(), baseline);
    assert!(harness.scheduler.is_empty());
    assert_eq!(harness.service.calls().len(), calls);
}
