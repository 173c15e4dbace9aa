//! Change and error notifications for the presentation layer.

/// Receives store notifications.
///
/// Both callbacks are invoked after the store released its state lock, so an
/// implementation may read the store (for example `TaskStore::snapshot`)
/// from inside the callback. Callbacks for completion handlers run on
/// whatever thread the scheduler used for the job.
pub trait StoreObserver: Send + Sync {
    /// Called after every change to cache contents, pending markers, or
    /// refreshing flags.
    fn on_change(&self);

    /// Called when a mutation rolled back or input was rejected. The message
    /// is human-readable and includes the underlying cause.
    fn on_error(&self, message: &str);
}

/// Observer built from two closures.
///
/// # Example
///
/// ```rust
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use taskstore::observer::{CallbackObserver, StoreObserver};
///
/// let changes = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&changes);
/// let observer = CallbackObserver::new(
///     move || {
///         counter.fetch_add(1, Ordering::SeqCst);
///     },
///     |message: &str| eprintln!("{message}"),
/// );
///
/// observer.on_change();
/// assert_eq!(changes.load(Ordering::SeqCst), 1);
/// ```
pub struct CallbackObserver<C, E> {
    on_change: C,
    on_error: E,
}

impl<C, E> CallbackObserver<C, E>
where
    C: Fn() + Send + Sync,
    E: Fn(&str) + Send + Sync,
{
    /// Creates an observer from a change callback and an error callback.
    pub const fn new(on_change: C, on_error: E) -> Self {
        Self {
            on_change,
            on_error,
        }
    }
}

impl<C, E> StoreObserver for CallbackObserver<C, E>
where
    C: Fn() + Send + Sync,
    E: Fn(&str) + Send + Sync,
{
    fn on_change(&self) {
        (self.on_change)();
    }

    fn on_error(&self, message: &str) {
        (self.on_error)(message);
    }
}

impl<C, E> std::fmt::Debug for CallbackObserver<C, E> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.debug_struct("CallbackObserver").finish_non_exhaustive()
    }
}

/// Observer that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl StoreObserver for TracingObserver {
    fn on_change(&self) {
        tracing::trace!("store.changed");
    }

    fn on_error(&self, message: &str) {
        tracing::warn!(message, "store.error");
    }
}
