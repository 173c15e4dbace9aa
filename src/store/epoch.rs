//! Generation counters for discarding superseded refresh results.
//!
//! Each refresh captures an [`Epoch`] when it starts. When its fetch returns,
//! the result is applied only if the partition's recorded epoch is still the
//! one captured; any later refresh of the same partition makes it stale.

use crate::domain::Partition;

/// A refresh generation. Later epochs compare greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Epoch(u64);

impl Epoch {
    /// Returns the raw generation number.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Monotonic epoch source. The first issued epoch is 1.
#[derive(Debug, Clone, Default)]
pub struct EpochClock {
    latest: u64,
}

impl EpochClock {
    /// Creates a clock that has issued nothing yet.
    #[must_use]
    pub const fn new() -> Self {
        Self { latest: 0 }
    }

    /// Issues the next epoch.
    pub const fn advance(&mut self) -> Epoch {
        self.latest += 1;
        Epoch(self.latest)
    }

    /// Returns the most recently issued epoch.
    #[must_use]
    pub const fn latest(&self) -> Epoch {
        Epoch(self.latest)
    }
}

/// Latest refresh epoch per partition, drawn from one shared clock.
#[derive(Debug, Clone, Default)]
pub struct PartitionEpochs {
    clock: EpochClock,
    current: [Epoch; 2],
}

impl PartitionEpochs {
    /// Creates epochs with nothing issued.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            clock: EpochClock::new(),
            current: [Epoch(0), Epoch(0)],
        }
    }

    /// Starts a new refresh generation for `partition` and returns its epoch.
    pub const fn begin(&mut self, partition: Partition) -> Epoch {
        let epoch = self.clock.advance();
        self.current[partition.index()] = epoch;
        epoch
    }

    /// Returns the epoch of the latest refresh of `partition`.
    #[must_use]
    pub const fn current(&self, partition: Partition) -> Epoch {
        self.current[partition.index()]
    }

    /// Returns `true` if `epoch` is still the latest refresh of `partition`.
    #[must_use]
    pub fn is_current(&self, partition: Partition, epoch: Epoch) -> bool {
        self.current(partition) == epoch
    }
}
