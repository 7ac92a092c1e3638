//! Channel registry configuration.

use serde::{Deserialize, Serialize};

/// What the registry does when a channel is created under an id that
/// already holds a live channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplacePolicy {
    /// Refuse the new channel with `ChannelExists`.
    #[default]
    Reject,
    /// Close the existing channel, releasing its subscriptions, and install
    /// the new one in its place.
    CloseExisting,
}

/// Channel registry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Policy for channel ids that are already in use.
    #[serde(default)]
    pub replace_policy: ReplacePolicy,
    /// Whether a channel whose start failed part-way is still published.
    ///
    /// When `false` the registry closes it before returning the error.
    #[serde(default)]
    pub publish_on_start_failure: bool,
    /// Outbound buffer size for in-memory transports.
    #[serde(default = "default_transport_buffer")]
    pub transport_buffer_size: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            replace_policy: ReplacePolicy::default(),
            publish_on_start_failure: false,
            transport_buffer_size: default_transport_buffer(),
        }
    }
}

fn default_transport_buffer() -> usize {
    256
}
