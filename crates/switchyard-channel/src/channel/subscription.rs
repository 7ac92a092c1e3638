//! Channel subscriptions — a channel-key bound to a sync or async handler.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;

use super::channel::Channel;
use super::types::{SetupResult, SubscriptionParams};

/// Synchronous subscription handler.
pub type SyncHandler = dyn Fn(&SubscriptionParams, &Arc<Channel>) -> SetupResult + Send + Sync;

/// Asynchronous subscription handler.
pub type AsyncHandler =
    dyn Fn(SubscriptionParams, Arc<Channel>) -> BoxFuture<'static, SetupResult> + Send + Sync;

/// The handler shape of a subscription. Exactly one is present.
#[derive(Clone)]
pub enum SubscriptionHandler {
    /// Handler that returns its resource immediately.
    Sync(Arc<SyncHandler>),
    /// Handler that resolves its resource later.
    Async(Arc<AsyncHandler>),
}

impl fmt::Debug for SubscriptionHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync(_) => write!(f, "Sync(..)"),
            Self::Async(_) => write!(f, "Async(..)"),
        }
    }
}

/// Binds an application topic (the channel-key, not the channel id) to the
/// handler that sets up delivery for it.
#[derive(Debug, Clone)]
pub struct ChannelSubscription {
    channel_key: String,
    handler: SubscriptionHandler,
}

impl ChannelSubscription {
    /// Creates a subscription with a synchronous handler.
    pub fn new<F>(channel_key: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&SubscriptionParams, &Arc<Channel>) -> SetupResult + Send + Sync + 'static,
    {
        Self {
            channel_key: channel_key.into(),
            handler: SubscriptionHandler::Sync(Arc::new(handler)),
        }
    }

    /// Creates a subscription with an asynchronous handler.
    pub fn new_async<F, Fut>(channel_key: impl Into<String>, handler: F) -> Self
    where
        F: Fn(SubscriptionParams, Arc<Channel>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = SetupResult> + Send + 'static,
    {
        let handler: Arc<AsyncHandler> = Arc::new(
            move |params: SubscriptionParams, channel: Arc<Channel>| -> BoxFuture<'static, SetupResult> {
                Box::pin(handler(params, channel))
            },
        );
        Self {
            channel_key: channel_key.into(),
            handler: SubscriptionHandler::Async(handler),
        }
    }

    /// The topic this subscription serves.
    pub fn channel_key(&self) -> &str {
        &self.channel_key
    }

    /// The handler.
    pub fn handler(&self) -> &SubscriptionHandler {
        &self.handler
    }

    /// Whether the handler is asynchronous.
    pub fn is_async(&self) -> bool {
        matches!(self.handler, SubscriptionHandler::Async(_))
    }

    pub(crate) async fn invoke(
        &self,
        params: SubscriptionParams,
        channel: &Arc<Channel>,
    ) -> SetupResult {
        match &self.handler {
            SubscriptionHandler::Sync(handler) => handler(&params, channel),
            SubscriptionHandler::Async(handler) => handler(params, channel.clone()).await,
        }
    }
}
