//! # switchyard
//!
//! Server-side real-time channel core. Re-exports the workspace crates and
//! provides tracing initialisation for binaries embedding the registry.

pub mod logging;

pub use switchyard_channel::{
    Channel, ChannelRegistry, ChannelState, ChannelSubscription, Disposable, Disposer,
    ListenerRegistration, MemoryTransport, MetricsSnapshot, SubscriptionParams,
};
pub use switchyard_core::config::{AppConfig, ChannelConfig, LoggingConfig, ReplacePolicy};
pub use switchyard_core::{AppError, AppResult, ChannelMessage, ChannelTransport, ErrorKind};
