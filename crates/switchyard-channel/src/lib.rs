//! # switchyard-channel
//!
//! Server-side channel core for Switchyard. Provides:
//!
//! - Per-client channels backed by pluggable transports
//! - New-channel listeners (sync and async) with disposable registrations
//! - Keyed subscriptions whose resources are released on close
//! - A concurrent registry with per-id serialized transport replacement
//! - An in-memory transport for single-process use

pub mod channel;
pub mod disposable;
pub mod listener;
pub mod metrics;
pub mod transport;

pub use channel::{
    Channel, ChannelRegistry, ChannelState, ChannelSubscription, SetupResult, SubscriptionHandler,
    SubscriptionParams,
};
pub use disposable::{Disposable, Disposer};
pub use listener::{ListenerList, ListenerRegistration};
pub use metrics::{MetricsSnapshot, RegistryMetrics};
pub use transport::MemoryTransport;
