//! Registry metrics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Registry-level counters.
#[derive(Debug)]
pub struct RegistryMetrics {
    /// Channels published into the registry
    pub channels_created: AtomicU64,
    /// Channels closed
    pub channels_closed: AtomicU64,
    /// Channels refused because the id was taken
    pub channels_rejected: AtomicU64,
    /// Transports installed
    pub transports_created: AtomicU64,
    /// Transports disposed after replacement or removal
    pub transports_disposed: AtomicU64,
    /// Messages accepted by a transport
    pub messages_queued: AtomicU64,
    /// New-channel listener failures
    pub listener_failures: AtomicU64,
}

impl RegistryMetrics {
    /// Create new zeroed metrics
    pub fn new() -> Self {
        Self {
            channels_created: AtomicU64::new(0),
            channels_closed: AtomicU64::new(0),
            channels_rejected: AtomicU64::new(0),
            transports_created: AtomicU64::new(0),
            transports_disposed: AtomicU64::new(0),
            messages_queued: AtomicU64::new(0),
            listener_failures: AtomicU64::new(0),
        }
    }

    pub(crate) fn channel_created(&self) {
        self.channels_created.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn channel_closed(&self) {
        self.channels_closed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn channel_rejected(&self) {
        self.channels_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn transport_created(&self) {
        self.transports_created.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn transport_disposed(&self) {
        self.transports_disposed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn message_queued(&self) {
        self.messages_queued.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn listener_failed(&self) {
        self.listener_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            channels_created: self.channels_created.load(Ordering::Relaxed),
            channels_closed: self.channels_closed.load(Ordering::Relaxed),
            channels_rejected: self.channels_rejected.load(Ordering::Relaxed),
            transports_created: self.transports_created.load(Ordering::Relaxed),
            transports_disposed: self.transports_disposed.load(Ordering::Relaxed),
            messages_queued: self.messages_queued.load(Ordering::Relaxed),
            listener_failures: self.listener_failures.load(Ordering::Relaxed),
        }
    }
}

impl Default for RegistryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable metrics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Channels published into the registry
    pub channels_created: u64,
    /// Channels closed
    pub channels_closed: u64,
    /// Channels refused because the id was taken
    pub channels_rejected: u64,
    /// Transports installed
    pub transports_created: u64,
    /// Transports disposed after replacement or removal
    pub transports_disposed: u64,
    /// Messages accepted by a transport
    pub messages_queued: u64,
    /// New-channel listener failures
    pub listener_failures: u64,
}
