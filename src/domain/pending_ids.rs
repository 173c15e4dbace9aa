//! Set of task ids with automatic inline/tree representation switching.
//!
//! The store tracks ids under in-flight operations in [`PendingIds`]. In
//! practice these sets hold a handful of ids at a time, so the collection
//! keeps them inline in a sorted `SmallVec` and only promotes to a
//! `BTreeSet` once it grows past [`SMALL_THRESHOLD`] elements.
//!
//! # State Transitions
//!
//! ```text
//!                    insert (n < 8)
//!     Empty ─────────────────────────────► Small
//!       ▲                                    │
//!       │ remove (n == 0)                    │ insert (n == 8)
//!       │                                    ▼
//!       └─────────────── Small ◄──────── Large
//!                     remove (n == 8)
//! ```
//!
//! Iteration is ascending by id in every state.

use std::collections::BTreeSet;

use smallvec::SmallVec;

use super::TaskId;

/// Collections with more than this many elements use a `BTreeSet`.
const SMALL_THRESHOLD: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
enum PendingIdsInner {
    Empty,
    /// Sorted, deduplicated.
    Small(SmallVec<[TaskId; SMALL_THRESHOLD]>),
    Large(BTreeSet<TaskId>),
}

/// An ordered set of task ids.
///
/// # Examples
///
/// ```rust
/// use taskstore::domain::{PendingIds, TaskId};
///
/// let mut ids = PendingIds::new();
/// assert!(ids.insert(TaskId::new(3)));
/// assert!(ids.insert(TaskId::new(-1)));
/// assert!(!ids.insert(TaskId::new(3)));
///
/// let sorted: Vec<i64> = ids.iter().map(TaskId::get).collect();
/// assert_eq!(sorted, vec![-1, 3]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingIds {
    inner: PendingIdsInner,
}

impl PendingIds {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: PendingIdsInner::Empty,
        }
    }

    /// Returns the number of ids in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        match &self.inner {
            PendingIdsInner::Empty => 0,
            PendingIdsInner::Small(ids) => ids.len(),
            PendingIdsInner::Large(ids) => ids.len(),
        }
    }

    /// Returns `true` if the set holds no ids.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self.inner, PendingIdsInner::Empty)
    }

    /// Returns `true` if `id` is in the set.
    #[must_use]
    pub fn contains(&self, id: TaskId) -> bool {
        match &self.inner {
            PendingIdsInner::Empty => false,
            PendingIdsInner::Small(ids) => ids.binary_search(&id).is_ok(),
            PendingIdsInner::Large(ids) => ids.contains(&id),
        }
    }

    /// Adds `id`. Returns `false` if it was already present.
    pub fn insert(&mut self, id: TaskId) -> bool {
        match &mut self.inner {
            PendingIdsInner::Empty => {
                let mut ids = SmallVec::new();
                ids.push(id);
                self.inner = PendingIdsInner::Small(ids);
                true
            }
            PendingIdsInner::Small(ids) => match ids.binary_search(&id) {
                Ok(_) => false,
                Err(position) => {
                    if ids.len() < SMALL_THRESHOLD {
                        ids.insert(position, id);
                    } else {
                        let mut promoted: BTreeSet<TaskId> = ids.drain(..).collect();
                        promoted.insert(id);
                        self.inner = PendingIdsInner::Large(promoted);
                    }
                    true
                }
            },
            PendingIdsInner::Large(ids) => ids.insert(id),
        }
    }

    /// Removes `id`. Returns `false` if it was not present.
    pub fn remove(&mut self, id: TaskId) -> bool {
        match &mut self.inner {
            PendingIdsInner::Empty => false,
            PendingIdsInner::Small(ids) => match ids.binary_search(&id) {
                Ok(position) => {
                    ids.remove(position);
                    if ids.is_empty() {
                        self.inner = PendingIdsInner::Empty;
                    }
                    true
                }
                Err(_) => false,
            },
            PendingIdsInner::Large(ids) => {
                let removed = ids.remove(&id);
                if removed && ids.len() <= SMALL_THRESHOLD {
                    let demoted: SmallVec<[TaskId; SMALL_THRESHOLD]> =
                        ids.iter().copied().collect();
                    self.inner = PendingIdsInner::Small(demoted);
                }
                removed
            }
        }
    }

    /// Returns an iterator over the ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = TaskId> + '_ {
        let (small, large) = match &self.inner {
            PendingIdsInner::Empty => (None, None),
            PendingIdsInner::Small(ids) => (Some(ids.iter().copied()), None),
            PendingIdsInner::Large(ids) => (None, Some(ids.iter().copied())),
        };
        small.into_iter().flatten().chain(large.into_iter().flatten())
    }

    /// Returns `true` if the set is in the Empty state.
    #[cfg(test)]
    const fn is_empty_state(&self) -> bool {
        matches!(self.inner, PendingIdsInner::Empty)
    }

    /// Returns `true` if the set is in the Small state.
    #[cfg(test)]
    const fn is_small_state(&self) -> bool {
        matches!(self.inner, PendingIdsInner::Small(_))
    }

    /// Returns `true` if the set is in the Large state.
    #[cfg(test)]
    const fn is_large_state(&self) -> bool {
        matches!(self.inner, PendingIdsInner::Large(_))
    }
}

impl Default for PendingIds {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<TaskId> for PendingIds {
    fn from_iter<I: IntoIterator<Item = TaskId>>(iter: I) -> Self {
        let mut ids = Self::new();
        for id in iter {
            ids.insert(id);
        }
        ids
    }
}

impl Extend<TaskId> for PendingIds {
    fn extend<I: IntoIterator<Item = TaskId>>(&mut self, iter: I) {
        for id in iter {
            self.insert(id);
        }
    }
}
