//! Disposable resources.
//!
//! Listeners and subscription handlers hand back a [`Disposable`] for
//! whatever they acquired; the channel releases it when the subscription or
//! the channel itself goes away. Disposal is idempotent everywhere.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// A resource whose release is owed to its holder.
pub trait Disposable: Send + Sync {
    /// Releases the resource. A second call is a no-op.
    fn dispose(&self);
}

impl<T: Disposable + ?Sized> Disposable for Box<T> {
    fn dispose(&self) {
        (**self).dispose();
    }
}

impl<T: Disposable + ?Sized> Disposable for Arc<T> {
    fn dispose(&self) {
        (**self).dispose();
    }
}

type DisposeAction = Box<dyn FnOnce() + Send>;

/// Runs a release action at most once.
pub struct Disposer {
    action: Mutex<Option<DisposeAction>>,
    disposed: AtomicBool,
}

impl Disposer {
    /// Wraps `action` so that it runs on the first `dispose()` only.
    pub fn new<F>(action: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            action: Mutex::new(Some(Box::new(action))),
            disposed: AtomicBool::new(false),
        }
    }

    /// A disposer that holds nothing.
    pub fn noop() -> Self {
        Self {
            action: Mutex::new(None),
            disposed: AtomicBool::new(false),
        }
    }

    /// Boxes the disposer, the shape listeners and handlers return.
    pub fn boxed(self) -> Box<dyn Disposable> {
        Box::new(self)
    }

    /// Returns whether `dispose()` has been called.
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}

impl Disposable for Disposer {
    fn dispose(&self) {
        // Take under the lock, run outside it: the action may re-enter.
        let action = self
            .action
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.disposed.store(true, Ordering::SeqCst);
        if let Some(action) = action {
            action();
        }
    }
}

impl fmt::Debug for Disposer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disposer")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
