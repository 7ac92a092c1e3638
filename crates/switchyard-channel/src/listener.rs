//! Ordered listener lists with disposable registrations.
//!
//! Readers take a snapshot before invoking anything, so a registration or
//! disposal racing with an in-progress invocation never tears the list and
//! never skips or repeats a listener that was already captured.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::disposable::{Disposable, Disposer};

struct ListenerEntry<T: ?Sized> {
    seq: u64,
    listener: Arc<T>,
}

/// Registration-ordered collection of listeners.
pub struct ListenerList<T: ?Sized> {
    entries: Arc<RwLock<Vec<ListenerEntry<T>>>>,
    next_seq: AtomicU64,
}

impl<T: ?Sized + Send + Sync + 'static> ListenerList<T> {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(Vec::new())),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Appends `listener` and returns the token that removes it again.
    pub fn register(&self, listener: Arc<T>) -> ListenerRegistration {
        let seq = {
            let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
            let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
            entries.push(ListenerEntry { seq, listener });
            seq
        };

        let entries = Arc::downgrade(&self.entries);
        let disposer = Disposer::new(move || {
            if let Some(entries) = entries.upgrade() {
                let mut entries = entries.write().unwrap_or_else(PoisonError::into_inner);
                if let Some(pos) = entries.iter().position(|e| e.seq == seq) {
                    entries.remove(pos);
                }
            }
        });

        ListenerRegistration { seq, disposer }
    }

    /// Returns the current listeners in registration order.
    pub fn snapshot(&self) -> Vec<Arc<T>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|e| e.listener.clone())
            .collect()
    }

    /// Returns the number of registered listeners.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns whether no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: ?Sized + Send + Sync + 'static> Default for ListenerList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized + Send + Sync + 'static> fmt::Debug for ListenerList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerList")
            .field("len", &self.len())
            .finish()
    }
}

/// Token returned by [`ListenerList::register`].
///
/// Disposing it removes exactly the entry it was issued for. Dropping it
/// without disposing leaves the listener registered.
#[must_use = "the listener stays registered until the registration is disposed"]
#[derive(Debug)]
pub struct ListenerRegistration {
    seq: u64,
    disposer: Disposer,
}

impl ListenerRegistration {
    /// Sequence number of the registration within its list.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Returns whether the registration has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.disposer.is_disposed()
    }
}

impl Disposable for ListenerRegistration {
    fn dispose(&self) {
        self.disposer.dispose();
    }
}
