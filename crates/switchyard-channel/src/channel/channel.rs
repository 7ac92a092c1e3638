//! A single channel with its subscription resources.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tracing::{debug, info, warn};

use switchyard_core::{AppError, AppResult, ChannelMessage};

use crate::disposable::Disposable;

use super::registry::ChannelRegistry;
use super::subscription::ChannelSubscription;
use super::types::{AsyncChannelListener, ChannelListener, ChannelState, SubscriptionParams};

/// A resource held on behalf of a subscription.
struct ActiveSubscription {
    /// Channel-key for resources added through [`Channel::subscribe`];
    /// `None` for resources returned by new-channel listeners.
    key: Option<String>,
    resource: Box<dyn Disposable>,
}

struct ChannelInner {
    state: ChannelState,
    subscriptions: Vec<ActiveSubscription>,
}

/// One logical, addressable endpoint, normally one per connected client.
///
/// The channel owns the resources its subscriptions acquired and releases
/// them on [`close`](Channel::close) (or on drop, if never closed). It does
/// not own the transport: messages go to whatever transport the registry
/// holds under the same id at the time they are queued.
pub struct Channel {
    id: String,
    registry: Weak<ChannelRegistry>,
    inner: Mutex<ChannelInner>,
}

impl Channel {
    pub(crate) fn new(registry: Weak<ChannelRegistry>, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            registry,
            inner: Mutex::new(ChannelInner {
                state: ChannelState::Created,
                subscriptions: Vec::new(),
            }),
        }
    }

    /// Channel ID.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ChannelState {
        self.lock().state
    }

    /// Whether every new-channel listener completed.
    pub fn is_running(&self) -> bool {
        self.state() == ChannelState::Running
    }

    /// Number of held subscription resources.
    pub fn subscription_count(&self) -> usize {
        self.lock().subscriptions.len()
    }

    /// Channel-keys of the active keyed subscriptions, in subscribe order.
    pub fn subscription_keys(&self) -> Vec<String> {
        self.lock()
            .subscriptions
            .iter()
            .filter_map(|s| s.key.clone())
            .collect()
    }

    /// The owning registry, if it is still alive.
    pub fn registry(&self) -> Option<Arc<ChannelRegistry>> {
        self.registry.upgrade()
    }

    /// Runs the new-channel listeners against this channel.
    ///
    /// Synchronous listeners run first, then asynchronous ones are awaited
    /// one at a time, each group in registration order. Every returned
    /// resource is held as a subscription. The first failure is returned
    /// and leaves the state at [`ChannelState::Failed`]; resources from
    /// earlier listeners stay held until the channel is closed.
    pub async fn start(
        self: &Arc<Self>,
        listeners: &[Arc<ChannelListener>],
        async_listeners: &[Arc<AsyncChannelListener>],
    ) -> AppResult<()> {
        {
            let mut inner = self.lock();
            if inner.state != ChannelState::Created {
                return Err(AppError::internal(format!(
                    "Channel '{}' cannot start from state {}",
                    self.id, inner.state
                )));
            }
            inner.state = ChannelState::Starting;
        }

        for (index, listener) in listeners.iter().enumerate() {
            let resource = listener(self).inspect_err(|e| self.fail_start(index, e))?;
            self.hold(None, resource)?;
        }

        for (index, listener) in async_listeners.iter().enumerate() {
            let resource = listener(self.clone())
                .await
                .inspect_err(|e| self.fail_start(listeners.len() + index, e))?;
            self.hold(None, resource)?;
        }

        let mut inner = self.lock();
        if inner.state == ChannelState::Starting {
            inner.state = ChannelState::Running;
        }
        debug!(
            channel_id = %self.id,
            subscriptions = inner.subscriptions.len(),
            "Channel started"
        );
        Ok(())
    }

    /// Applies `subscription` to this channel with `params`.
    ///
    /// The handler's resource is held under the subscription's channel-key
    /// until [`unsubscribe`](Channel::unsubscribe) or close.
    pub async fn subscribe(
        self: &Arc<Self>,
        subscription: &ChannelSubscription,
        params: SubscriptionParams,
    ) -> AppResult<()> {
        if self.state() == ChannelState::Closed {
            return Err(AppError::channel_closed(&self.id));
        }

        let resource = subscription.invoke(params, self).await?;
        self.hold(Some(subscription.channel_key().to_string()), resource)?;

        debug!(
            channel_id = %self.id,
            channel_key = %subscription.channel_key(),
            "Subscription added"
        );
        Ok(())
    }

    /// Releases every resource held under `channel_key`, newest first.
    ///
    /// Returns how many were released.
    pub fn unsubscribe(&self, channel_key: &str) -> usize {
        let removed: Vec<ActiveSubscription> = {
            let mut inner = self.lock();
            let (removed, kept) = std::mem::take(&mut inner.subscriptions)
                .into_iter()
                .partition(|s| s.key.as_deref() == Some(channel_key));
            inner.subscriptions = kept;
            removed
        };

        for subscription in removed.iter().rev() {
            subscription.resource.dispose();
        }

        debug!(
            channel_id = %self.id,
            channel_key = %channel_key,
            released = removed.len(),
            "Subscription removed"
        );
        removed.len()
    }

    /// Queues `value` for delivery through the transport registered under
    /// this channel's id.
    ///
    /// Returns once the transport has accepted the message; delivery to the
    /// remote end is not awaited.
    pub fn queue(&self, value: serde_json::Value, path: Option<&str>) -> AppResult<()> {
        if !self.state().accepts_messages() {
            return Err(AppError::channel_closed(&self.id));
        }

        let registry = self
            .registry
            .upgrade()
            .ok_or_else(|| AppError::transport_unavailable(&self.id))?;
        let transport = registry
            .get_channel_transport(&self.id)
            .ok_or_else(|| AppError::transport_unavailable(&self.id))?;

        let message = ChannelMessage::new(self.id.clone(), value, path.map(str::to_string));
        let message_id = message.id;
        transport.deliver(message)?;

        registry.metrics().message_queued();
        debug!(
            channel_id = %self.id,
            message_id = %message_id,
            path = path.unwrap_or(""),
            "Message queued"
        );
        Ok(())
    }

    /// Closes the channel and releases every held resource in reverse
    /// acquisition order. A published channel is also dropped from its
    /// registry.
    ///
    /// Idempotent; returns how many resources this call released.
    pub fn close(&self) -> usize {
        let subscriptions = {
            let mut inner = self.lock();
            if inner.state == ChannelState::Closed {
                return 0;
            }
            inner.state = ChannelState::Closed;
            std::mem::take(&mut inner.subscriptions)
        };

        for subscription in subscriptions.iter().rev() {
            subscription.resource.dispose();
        }

        if let Some(registry) = self.registry.upgrade() {
            registry.unpublish(self);
            registry.metrics().channel_closed();
        }
        info!(
            channel_id = %self.id,
            released = subscriptions.len(),
            "Channel closed"
        );
        subscriptions.len()
    }

    fn hold(&self, key: Option<String>, resource: Box<dyn Disposable>) -> AppResult<()> {
        let mut inner = self.lock();
        if inner.state == ChannelState::Closed {
            drop(inner);
            resource.dispose();
            return Err(AppError::channel_closed(&self.id));
        }
        inner.subscriptions.push(ActiveSubscription { key, resource });
        Ok(())
    }

    fn fail_start(&self, index: usize, error: &AppError) {
        let mut inner = self.lock();
        if inner.state == ChannelState::Starting {
            inner.state = ChannelState::Failed;
        }
        warn!(
            channel_id = %self.id,
            listener = index,
            held = inner.subscriptions.len(),
            error = %error,
            "New-channel listener failed"
        );
    }

    fn lock(&self) -> MutexGuard<'_, ChannelInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Channel {
    fn drop(&mut self) {
        let inner = self.inner.get_mut().unwrap_or_else(PoisonError::into_inner);
        if inner.subscriptions.is_empty() {
            return;
        }
        debug!(
            channel_id = %self.id,
            released = inner.subscriptions.len(),
            "Releasing subscriptions of dropped channel"
        );
        for subscription in inner.subscriptions.drain(..).rev() {
            subscription.resource.dispose();
        }
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("Channel")
            .field("id", &self.id)
            .field("state", &inner.state)
            .field("subscriptions", &inner.subscriptions.len())
            .finish()
    }
}
