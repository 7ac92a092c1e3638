//! Per-id transport slot.

use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::{Mutex, OwnedMutexGuard};

use switchyard_core::ChannelTransport;

/// Holds the current transport for one channel id.
///
/// Replacements for the same id are serialized through `replace_lock`;
/// readers only touch `current` and never wait on a replacement.
#[derive(Debug)]
pub(crate) struct TransportSlot {
    replace_lock: Arc<Mutex<()>>,
    current: RwLock<Option<Arc<dyn ChannelTransport>>>,
}

impl TransportSlot {
    pub(crate) fn new() -> Self {
        Self {
            replace_lock: Arc::new(Mutex::new(())),
            current: RwLock::new(None),
        }
    }

    /// Waits for exclusive replacement rights on this slot.
    pub(crate) async fn lock(&self) -> OwnedMutexGuard<()> {
        self.replace_lock.clone().lock_owned().await
    }

    pub(crate) fn current(&self) -> Option<Arc<dyn ChannelTransport>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn is_occupied(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Installs `next` and returns the previous transport.
    pub(crate) fn replace(
        &self,
        next: Option<Arc<dyn ChannelTransport>>,
    ) -> Option<Arc<dyn ChannelTransport>> {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *current, next)
    }
}
