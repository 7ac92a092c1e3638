//! Channel registry — owns transports, channels and new-channel listeners.

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::future::BoxFuture;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info, warn};

use switchyard_core::config::{ChannelConfig, ReplacePolicy};
use switchyard_core::{AppError, AppResult, ChannelTransport};

use crate::listener::{ListenerList, ListenerRegistration};
use crate::metrics::RegistryMetrics;
use crate::transport::slot::TransportSlot;

use super::channel::Channel;
use super::types::{AsyncChannelListener, ChannelListener, SetupResult};

/// Registry of live channels and the transports behind them.
///
/// Transports and channels are keyed by the same id but are independent
/// entries: a channel looks its transport up on every `queue`, so replacing
/// the transport under a live channel redirects its messages.
#[derive(Debug)]
pub struct ChannelRegistry {
    /// Registry settings.
    config: ChannelConfig,
    /// Channel id → transport slot.
    transports: DashMap<String, Arc<TransportSlot>>,
    /// Channel id → channel.
    channels: DashMap<String, Arc<Channel>>,
    /// Synchronous new-channel listeners.
    listeners: ListenerList<ChannelListener>,
    /// Asynchronous new-channel listeners.
    async_listeners: ListenerList<AsyncChannelListener>,
    metrics: RegistryMetrics,
}

impl ChannelRegistry {
    /// Creates an empty registry.
    pub fn new(config: ChannelConfig) -> Self {
        Self {
            config,
            transports: DashMap::new(),
            channels: DashMap::new(),
            listeners: ListenerList::new(),
            async_listeners: ListenerList::new(),
            metrics: RegistryMetrics::new(),
        }
    }

    /// Registry settings.
    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Registry counters.
    pub fn metrics(&self) -> &RegistryMetrics {
        &self.metrics
    }

    /// Registers a synchronous listener invoked for every channel created
    /// afterwards.
    pub fn on_new_channel<F>(&self, listener: F) -> ListenerRegistration
    where
        F: Fn(&Arc<Channel>) -> SetupResult + Send + Sync + 'static,
    {
        let registration = self.listeners.register(Arc::new(listener));
        debug!(seq = registration.seq(), "New-channel listener registered");
        registration
    }

    /// Registers an asynchronous listener invoked for every channel created
    /// afterwards, after all synchronous listeners.
    pub fn on_new_channel_async<F, Fut>(&self, listener: F) -> ListenerRegistration
    where
        F: Fn(Arc<Channel>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = SetupResult> + Send + 'static,
    {
        let listener: Arc<AsyncChannelListener> = Arc::new(
            move |channel: Arc<Channel>| -> BoxFuture<'static, SetupResult> {
                Box::pin(listener(channel))
            },
        );
        let registration = self.async_listeners.register(listener);
        debug!(seq = registration.seq(), "Async new-channel listener registered");
        registration
    }

    /// Number of registered new-channel listeners, both kinds.
    pub fn listener_count(&self) -> usize {
        self.listeners.len() + self.async_listeners.len()
    }

    /// Builds a transport with `factory` and installs it under `id`.
    ///
    /// Calls for the same id run one at a time; calls for different ids do
    /// not wait on each other. An existing transport is disposed once the
    /// new one is installed. If the factory fails, the existing transport
    /// stays in place and the error is returned.
    pub async fn create_channel_transport<T, F>(
        &self,
        id: impl Into<String>,
        factory: F,
    ) -> AppResult<Arc<dyn ChannelTransport>>
    where
        T: ChannelTransport,
        F: FnOnce() -> AppResult<T> + Send,
    {
        let id = id.into();
        let (slot, _guard) = self.lock_transport_slot(&id).await;

        let transport: Arc<dyn ChannelTransport> = match factory() {
            Ok(transport) => Arc::new(transport),
            Err(e) => {
                if !slot.is_occupied() {
                    self.transports.remove_if(&id, |_, s| Arc::ptr_eq(s, &slot));
                }
                warn!(channel_id = %id, error = %e, "Transport factory failed");
                return Err(e);
            }
        };

        if transport.id() != id {
            warn!(
                channel_id = %id,
                transport_id = %transport.id(),
                "Transport id differs from the id it is registered under"
            );
        }

        let previous = slot.replace(Some(transport.clone()));
        self.metrics.transport_created();

        match previous {
            Some(previous) => {
                previous.dispose().await;
                self.metrics.transport_disposed();
                info!(channel_id = %id, "Channel transport replaced");
            }
            None => info!(channel_id = %id, "Channel transport created"),
        }

        Ok(transport)
    }

    /// Uninstalls and disposes the transport under `id`.
    ///
    /// Returns `false` if no transport was installed.
    pub async fn remove_channel_transport(&self, id: &str) -> bool {
        let Some((slot, _guard)) = self.lock_existing_slot(id).await else {
            return false;
        };

        let previous = slot.replace(None);
        self.transports.remove_if(id, |_, s| Arc::ptr_eq(s, &slot));

        let Some(previous) = previous else {
            return false;
        };
        previous.dispose().await;
        self.metrics.transport_disposed();
        info!(channel_id = %id, "Channel transport removed");
        true
    }

    /// The transport currently installed under `id`.
    ///
    /// Never waits on an in-flight factory for the same id.
    pub fn get_channel_transport(&self, id: &str) -> Option<Arc<dyn ChannelTransport>> {
        self.transports.get(id).and_then(|slot| slot.current())
    }

    /// Number of installed transports.
    pub fn transport_count(&self) -> usize {
        self.transports
            .iter()
            .filter(|slot| slot.value().is_occupied())
            .count()
    }

    /// Creates, starts and publishes the channel `id`.
    ///
    /// Every registered listener (sync first, then async) runs against the
    /// new channel. A listener failure is returned to the caller; whether
    /// the failed channel is still published is governed by
    /// `publish_on_start_failure`. An id already in use is handled per
    /// `replace_policy`.
    pub async fn create_channel(self: &Arc<Self>, id: impl Into<String>) -> AppResult<Arc<Channel>> {
        let id = id.into();

        if self.config.replace_policy == ReplacePolicy::Reject && self.channels.contains_key(&id) {
            self.metrics.channel_rejected();
            warn!(channel_id = %id, "Channel id already in use");
            return Err(AppError::channel_exists(&id));
        }

        let channel = Arc::new(Channel::new(Arc::downgrade(self), id));
        let listeners = self.listeners.snapshot();
        let async_listeners = self.async_listeners.snapshot();

        if let Err(e) = channel.start(&listeners, &async_listeners).await {
            self.metrics.listener_failed();
            if self.config.publish_on_start_failure {
                self.publish(&channel)?;
            } else {
                channel.close();
            }
            return Err(e);
        }

        self.publish(&channel)?;
        Ok(channel)
    }

    /// Queues `value` on the channel `channel_id`.
    pub fn queue(
        &self,
        channel_id: &str,
        value: serde_json::Value,
        path: Option<&str>,
    ) -> AppResult<()> {
        let channel = self
            .get_channel(channel_id)
            .ok_or_else(|| AppError::unknown_channel(channel_id))?;
        channel.queue(value, path)
    }

    /// The live channel under `id`.
    pub fn get_channel(&self, id: &str) -> Option<Arc<Channel>> {
        self.channels.get(id).map(|c| c.value().clone())
    }

    /// Closes and unpublishes the channel under `id`.
    ///
    /// Returns `false` if there was none.
    pub fn close_channel(&self, id: &str) -> bool {
        let Some((_, channel)) = self.channels.remove(id) else {
            return false;
        };
        channel.close();
        true
    }

    /// Ids of all live channels.
    pub fn channel_ids(&self) -> Vec<String> {
        self.channels.iter().map(|c| c.key().clone()).collect()
    }

    /// Number of live channels.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Closes every channel and disposes every transport.
    pub async fn shutdown(&self) {
        let channels: Vec<Arc<Channel>> = self.channels.iter().map(|c| c.value().clone()).collect();
        for channel in &channels {
            channel.close();
        }

        let transport_ids: Vec<String> = self.transports.iter().map(|s| s.key().clone()).collect();
        let mut disposed = 0;
        for id in &transport_ids {
            if self.remove_channel_transport(id).await {
                disposed += 1;
            }
        }

        info!(
            channels = channels.len(),
            transports = disposed,
            "Channel registry shut down"
        );
    }

    /// Drops `channel` from the map if it is still the entry for its id.
    pub(crate) fn unpublish(&self, channel: &Channel) {
        self.channels
            .remove_if(channel.id(), |_, c| std::ptr::eq(Arc::as_ptr(c), channel));
    }

    fn publish(&self, channel: &Arc<Channel>) -> AppResult<()> {
        let outcome = match self.channels.entry(channel.id().to_string()) {
            Entry::Vacant(entry) => {
                entry.insert(channel.clone());
                Ok(None)
            }
            Entry::Occupied(mut entry) => match self.config.replace_policy {
                ReplacePolicy::Reject => Err(AppError::channel_exists(channel.id())),
                ReplacePolicy::CloseExisting => Ok(Some(entry.insert(channel.clone()))),
            },
        };

        match outcome {
            Ok(previous) => {
                self.metrics.channel_created();
                if let Some(previous) = previous {
                    previous.close();
                    info!(channel_id = %channel.id(), "Channel replaced");
                } else {
                    info!(channel_id = %channel.id(), "Channel created");
                }
                Ok(())
            }
            Err(e) => {
                self.metrics.channel_rejected();
                warn!(channel_id = %channel.id(), "Channel id taken while starting");
                channel.close();
                Err(e)
            }
        }
    }

    /// Locks the slot for `id`, creating it if absent.
    async fn lock_transport_slot(&self, id: &str) -> (Arc<TransportSlot>, OwnedMutexGuard<()>) {
        loop {
            let slot = self
                .transports
                .entry(id.to_string())
                .or_insert_with(|| Arc::new(TransportSlot::new()))
                .value()
                .clone();
            let guard = slot.lock().await;
            // The slot may have been dropped from the map while we waited.
            if self.is_current_slot(id, &slot) {
                return (slot, guard);
            }
        }
    }

    /// Locks the slot for `id` if one exists.
    async fn lock_existing_slot(&self, id: &str) -> Option<(Arc<TransportSlot>, OwnedMutexGuard<()>)> {
        loop {
            let slot = self.transports.get(id)?.value().clone();
            let guard = slot.lock().await;
            if self.is_current_slot(id, &slot) {
                return Some((slot, guard));
            }
        }
    }

    fn is_current_slot(&self, id: &str, slot: &Arc<TransportSlot>) -> bool {
        self.transports
            .get(id)
            .is_some_and(|current| Arc::ptr_eq(current.value(), slot))
    }
}
