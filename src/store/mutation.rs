//! Optimistic mutation transitions.
//!
//! Each mutation is split in two halves that run under separate lock
//! acquisitions:
//!
//! - `begin_*` applies the change to the cache, marks the id pending, and
//!   returns a ticket carrying everything needed to undo it
//! - `settle_*` consumes the ticket together with the service result,
//!   finalizes or rolls back, and clears the pending markers
//!
//! A settle returns the [`RollbackError`] to report when the mutation was
//! undone.

use crate::domain::{Partition, Task, TaskId};
use crate::error::{MutationKind, PersistenceError, RollbackError, ValidationError, validate_subject};

use super::state::StoreState;

// =============================================================================
// Tickets
// =============================================================================

#[derive(Debug, Clone)]
pub(crate) struct CreateTicket {
    pub(crate) placeholder_id: TaskId,
    pub(crate) subject: String,
}

#[derive(Debug, Clone)]
pub(crate) struct DeleteTicket {
    pub(crate) removed: Task,
    partition: Partition,
    index: usize,
}

#[derive(Debug, Clone)]
pub(crate) struct ToggleTicket {
    pub(crate) id: TaskId,
    pub(crate) completed: bool,
    previous: bool,
    from: Partition,
    from_index: usize,
    to: Partition,
}

#[derive(Debug, Clone)]
pub(crate) struct RenameTicket {
    pub(crate) id: TaskId,
    pub(crate) subject: String,
    previous: String,
}

fn rolled_back<T>(kind: MutationKind, result: Result<T, PersistenceError>) -> Result<T, RollbackError> {
    result.map_err(|source| RollbackError::new(kind, source))
}

// =============================================================================
// Transitions
// =============================================================================

/// A created task must carry a real id; it always starts out pending.
fn confirmed_pending(mut created: Task) -> Result<Task, PersistenceError> {
    if created.id.get() <= 0 {
        return Err(PersistenceError::InvalidResponse(format!(
            "service assigned id {}",
            created.id
        )));
    }
    created.completed = false;
    Ok(created)
}

impl StoreState {
    /// Inserts a placeholder for an already validated subject.
    pub(crate) fn begin_create(&mut self, subject: &str) -> CreateTicket {
        let placeholder_id = TaskId::new(self.mint_placeholder());
        self.cache
            .push_front(Partition::Pending, Task::new(placeholder_id, subject, false));
        self.pending.insert(placeholder_id);
        CreateTicket {
            placeholder_id,
            subject: subject.to_string(),
        }
    }

    pub(crate) fn settle_create(
        &mut self,
        ticket: &CreateTicket,
        result: Result<Task, PersistenceError>,
    ) -> Result<(), RollbackError> {
        let placeholder_id = ticket.placeholder_id;
        let outcome = rolled_back(MutationKind::Create, result.and_then(confirmed_pending));
        match &outcome {
            Ok(created) => {
                for partition in Partition::ALL {
                    self.cache
                        .tasks_mut(partition)
                        .retain(|task| task.id != created.id);
                }
                if let Some(index) = self.cache.position(Partition::Pending, placeholder_id) {
                    self.cache.tasks_mut(Partition::Pending)[index] = created.clone();
                }
            }
            Err(_) => {
                self.cache.remove_from(Partition::Pending, placeholder_id);
            }
        }
        self.pending.remove(placeholder_id);
        outcome.map(drop)
    }

    /// Removes a confirmed task. Returns `None` if `id` is absent or a
    /// placeholder.
    pub(crate) fn begin_delete(&mut self, id: TaskId) -> Option<DeleteTicket> {
        if id.is_placeholder() {
            return None;
        }
        let (partition, index) = self.cache.locate(id)?;
        let removed = self.cache.remove_at(partition, index);
        self.pending.insert(id);
        self.pending_deletes.insert(id);
        Some(DeleteTicket {
            removed,
            partition,
            index,
        })
    }

    pub(crate) fn settle_delete(
        &mut self,
        ticket: DeleteTicket,
        result: Result<(), PersistenceError>,
    ) -> Result<(), RollbackError> {
        let DeleteTicket {
            removed,
            partition,
            index,
        } = ticket;
        let id = removed.id;
        let outcome = rolled_back(MutationKind::Delete, result);
        if outcome.is_err() {
            self.cache.insert_clamped(partition, index, removed);
        }
        self.pending_deletes.remove(id);
        self.pending.remove(id);
        outcome
    }

    /// Moves a confirmed task to the front of the partition matching
    /// `completed`. Returns `None` if `id` is absent, a placeholder, or
    /// already in that partition.
    pub(crate) fn begin_toggle(&mut self, id: TaskId, completed: bool) -> Option<ToggleTicket> {
        if id.is_placeholder() {
            return None;
        }
        let (from, from_index) = self.cache.locate(id)?;
        let to = Partition::from_completed(completed);
        if from == to {
            return None;
        }
        let mut task = self.cache.remove_at(from, from_index);
        let previous = task.completed;
        task.completed = completed;
        self.cache.push_front(to, task);
        self.pending.insert(id);
        Some(ToggleTicket {
            id,
            completed,
            previous,
            from,
            from_index,
            to,
        })
    }

    pub(crate) fn settle_toggle(
        &mut self,
        ticket: ToggleTicket,
        result: Result<(), PersistenceError>,
    ) -> Result<(), RollbackError> {
        let outcome = rolled_back(MutationKind::Toggle, result);
        if outcome.is_err()
            && let Some(mut task) = self.cache.remove_from(ticket.to, ticket.id)
        {
            task.completed = ticket.previous;
            self.cache.insert_clamped(ticket.from, ticket.from_index, task);
        }
        self.pending.remove(ticket.id);
        outcome
    }

    /// Overwrites the subject of a confirmed task in place.
    ///
    /// Returns `Ok(None)` if `id` is absent, a placeholder, or already has
    /// the trimmed subject.
    pub(crate) fn begin_rename(
        &mut self,
        id: TaskId,
        subject: &str,
    ) -> Result<Option<RenameTicket>, ValidationError> {
        if id.is_placeholder() {
            return Ok(None);
        }
        let Some(task) = self.cache.get_mut(id) else {
            return Ok(None);
        };
        let subject = validate_subject(subject)?;
        if task.subject == subject {
            return Ok(None);
        }
        let previous = std::mem::replace(&mut task.subject, subject.to_string());
        self.pending.insert(id);
        Ok(Some(RenameTicket {
            id,
            subject: subject.to_string(),
            previous,
        }))
    }

    pub(crate) fn settle_rename(
        &mut self,
        ticket: RenameTicket,
        result: Result<(), PersistenceError>,
    ) -> Result<(), RollbackError> {
        let outcome = rolled_back(MutationKind::Rename, result);
        if outcome.is_err()
            && let Some(task) = self.cache.get_mut(ticket.id)
        {
            task.subject = ticket.previous;
        }
        self.pending.remove(ticket.id);
        outcome
    }
}
