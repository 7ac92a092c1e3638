//! Channels, their subscriptions and the registry that owns them.

pub mod channel;
pub mod registry;
pub mod subscription;
pub mod types;

pub use channel::Channel;
pub use registry::ChannelRegistry;
pub use subscription::{ChannelSubscription, SubscriptionHandler};
pub use types::{ChannelState, SetupResult, SubscriptionParams};
