//! The state a [`TaskStore`](super::TaskStore) guards with its lock.
//!
//! Every method here is a synchronous transition; the store wraps each one
//! in a single lock acquisition and decides afterwards whether to notify.

use crate::domain::{Partition, PendingIds, Task};
use crate::error::PersistenceError;

use super::cache::TaskCache;
use super::epoch::{Epoch, PartitionEpochs};
use super::merge::{MergeContext, merge_both_partitions, merge_with_local_overrides};

/// Result of settling a single-partition refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RefreshOutcome {
    /// A newer refresh owns the partition; nothing changed.
    Stale,
    /// The fetch was merged. `changed` is `false` when the merge matched the
    /// cache.
    Applied { changed: bool },
    /// The fetch failed; the cache was kept.
    Failed(PersistenceError),
}

#[derive(Debug)]
pub(crate) struct StoreState {
    pub(crate) cache: TaskCache,
    pub(crate) pending: PendingIds,
    pub(crate) pending_deletes: PendingIds,
    epochs: PartitionEpochs,
    refreshing: [bool; 2],
    next_placeholder: i64,
}

impl Default for StoreState {
    fn default() -> Self {
        Self::with_cache(TaskCache::new())
    }
}

impl StoreState {
    pub(crate) fn with_cache(cache: TaskCache) -> Self {
        Self {
            cache,
            pending: PendingIds::new(),
            pending_deletes: PendingIds::new(),
            epochs: PartitionEpochs::new(),
            refreshing: [false; 2],
            next_placeholder: -1,
        }
    }

    pub(crate) const fn is_refreshing(&self, partition: Partition) -> bool {
        self.refreshing[partition.index()]
    }

    pub(crate) const fn refreshing_flags(&self) -> [bool; 2] {
        self.refreshing
    }

    pub(crate) fn merge_context(&self) -> MergeContext<'_> {
        MergeContext {
            cache: &self.cache,
            pending: &self.pending,
            pending_deletes: &self.pending_deletes,
        }
    }

    /// Mints the next placeholder id: -1, -2, ...
    pub(crate) const fn mint_placeholder(&mut self) -> i64 {
        let id = self.next_placeholder;
        self.next_placeholder -= 1;
        id
    }

    // =========================================================================
    // Refresh
    // =========================================================================

    /// Records a new epoch for `partition` and raises its refreshing flag.
    pub(crate) fn begin_refresh(&mut self, partition: Partition) -> Epoch {
        let epoch = self.epochs.begin(partition);
        self.refreshing[partition.index()] = true;
        epoch
    }

    /// Replaces `partition` with `merged` if it differs from the cache.
    /// Returns whether the cache changed.
    fn replace_if_changed(&mut self, partition: Partition, merged: Vec<Task>) -> bool {
        if merged.as_slice() == self.cache.tasks(partition) {
            return false;
        }
        self.cache.replace(partition, merged);
        true
    }

    pub(crate) fn settle_refresh(
        &mut self,
        partition: Partition,
        epoch: Epoch,
        result: Result<Vec<Task>, PersistenceError>,
    ) -> RefreshOutcome {
        if !self.epochs.is_current(partition, epoch) {
            return RefreshOutcome::Stale;
        }
        let outcome = match result {
            Ok(fetched) => {
                let merged =
                    merge_with_local_overrides(partition, fetched, self.merge_context());
                RefreshOutcome::Applied {
                    changed: self.replace_if_changed(partition, merged),
                }
            }
            Err(error) => RefreshOutcome::Failed(error),
        };
        self.refreshing[partition.index()] = false;
        outcome
    }

    /// Starts a refresh of both partitions, pending first.
    pub(crate) fn begin_warm(&mut self) -> [Epoch; 2] {
        Partition::ALL.map(|partition| self.begin_refresh(partition))
    }

    /// Applies both fetches if both succeeded and both epochs are still
    /// current, then clears each flag whose epoch is still current.
    ///
    /// The two lists are merged together so an id the service reported in
    /// both partitions ends up in exactly one.
    ///
    /// Returns `true` if the fetched lists were applied.
    pub(crate) fn settle_warm(
        &mut self,
        epochs: [Epoch; 2],
        results: [Result<Vec<Task>, PersistenceError>; 2],
    ) -> bool {
        let current = Partition::ALL.map(|partition| {
            self.epochs.is_current(partition, epochs[partition.index()])
        });

        let applied = match results {
            [Ok(pending), Ok(completed)] if current == [true, true] => {
                let [pending, completed] =
                    merge_both_partitions([pending, completed], self.merge_context());
                self.replace_if_changed(Partition::Pending, pending);
                self.replace_if_changed(Partition::Completed, completed);
                true
            }
            _ => false,
        };

        for partition in Partition::ALL {
            if current[partition.index()] {
                self.refreshing[partition.index()] = false;
            }
        }
        applied
    }
}
