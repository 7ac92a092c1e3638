//! Channel lifecycle states and listener signatures.

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use switchyard_core::AppResult;

use crate::disposable::Disposable;

use super::channel::Channel;

/// Parameters passed to a subscription handler.
pub type SubscriptionParams = serde_json::Map<String, serde_json::Value>;

/// What a listener or subscription handler produces: the resource the
/// channel must release later.
pub type SetupResult = AppResult<Box<dyn Disposable>>;

/// Synchronous new-channel listener.
pub type ChannelListener = dyn Fn(&Arc<Channel>) -> SetupResult + Send + Sync;

/// Asynchronous new-channel listener.
pub type AsyncChannelListener = dyn Fn(Arc<Channel>) -> BoxFuture<'static, SetupResult> + Send + Sync;

/// Lifecycle state of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelState {
    /// Constructed, listeners not yet invoked.
    Created,
    /// Listeners are being invoked.
    Starting,
    /// Every listener completed.
    Running,
    /// A listener failed; earlier subscriptions are still held.
    Failed,
    /// Closed; every subscription has been released.
    Closed,
}

impl ChannelState {
    /// Whether messages may be queued in this state.
    pub fn accepts_messages(self) -> bool {
        !matches!(self, ChannelState::Closed)
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Starting => write!(f, "starting"),
            Self::Running => write!(f, "running"),
            Self::Failed => write!(f, "failed"),
            Self::Closed => write!(f, "closed"),
        }
    }
}
