//! The optimistic, stale-while-revalidate task store.
//!
//! [`TaskStore`] caches tasks in two partitions, applies mutations locally
//! before they are persisted, and reconciles the cache with background
//! fetches without discarding local changes that are still in flight.
//!
//! # Overview
//!
//! - [`TaskCache`]: ordered tasks per partition
//! - [`PartitionEpochs`]: generation counters that make old fetches stale
//! - [`merge_with_local_overrides`], [`merge_both_partitions`]: the pure
//!   reconciliation steps
//! - [`TaskStore`]: the handle the presentation layer talks to
//! - [`AutoRefresh`]: guard for periodic background refresh

mod auto_refresh;
mod cache;
mod epoch;
mod merge;
mod mutation;
mod state;
mod task_store;

pub use auto_refresh::AutoRefresh;
pub use cache::TaskCache;
pub use epoch::{Epoch, EpochClock, PartitionEpochs};
pub use merge::{
    MergeContext, merge_both_partitions, merge_with_local_overrides, overlay_local_state,
};
pub use task_store::{StoreSnapshot, TaskStore};
