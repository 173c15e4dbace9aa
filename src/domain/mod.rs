//! Domain types shared by the store and the task service.
//!
//! - [`Task`]: the record the store caches
//! - [`TaskId`]: service-assigned ids and store-minted placeholders
//! - [`Partition`]: the two logical groupings (pending / completed)
//! - [`PendingIds`]: the set type used for in-flight bookkeeping

mod pending_ids;
mod task;

pub use pending_ids::PendingIds;
pub use task::{Partition, Task, TaskId};
