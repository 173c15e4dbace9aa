//! Runtime lookup for hosts that build the store outside of tokio.
//!
//! When called inside a tokio runtime the current runtime's handle is used, so
//! spawned jobs inherit its tracing and metrics setup. Outside of one, a
//! lazily-initialized multi-thread runtime is shared by every caller and never
//! dropped.

use std::cell::RefCell;
use std::sync::LazyLock;

use tokio::runtime::{Builder, Handle, Runtime};

/// Global tokio runtime initialized lazily on first access.
static GLOBAL_RUNTIME: LazyLock<Runtime> = LazyLock::new(|| {
    Builder::new_multi_thread()
        .worker_threads(num_cpus::get().clamp(1, 4))
        .thread_name("taskstore-worker")
        .enable_all()
        .build()
        .expect("Failed to create global tokio runtime")
});

thread_local! {
    /// Thread-local cached handle to the global runtime.
    static CACHED_HANDLE: RefCell<Option<Handle>> = const { RefCell::new(None) };
}

/// Returns a reference to the global runtime.
#[inline]
#[must_use]
pub fn global() -> &'static Runtime {
    &GLOBAL_RUNTIME
}

/// Returns a handle to the current runtime, or to the global one.
///
/// # Handle Priority
///
/// 1. If inside a tokio runtime: returns `Handle::current()`
/// 2. Otherwise: returns the cached `global().handle()` (initializing if needed)
#[inline]
#[must_use]
pub fn handle() -> Handle {
    if let Ok(current_handle) = Handle::try_current() {
        return current_handle;
    }

    CACHED_HANDLE.with(|cached| {
        cached
            .borrow_mut()
            .get_or_insert_with(|| global().handle().clone())
            .clone()
    })
}
