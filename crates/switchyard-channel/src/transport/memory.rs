//! In-memory transport for single-process use and tests.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use switchyard_core::{AppError, AppResult, ChannelMessage, ChannelTransport};

/// Transport backed by a bounded mpsc queue.
///
/// The receiving half is returned to the caller on construction; it ends
/// once the transport is disposed.
#[derive(Debug)]
pub struct MemoryTransport {
    id: String,
    sender: Mutex<Option<mpsc::Sender<ChannelMessage>>>,
}

impl MemoryTransport {
    /// Create a transport with room for `buffer_size` undelivered messages
    pub fn new(id: impl Into<String>, buffer_size: usize) -> (Self, mpsc::Receiver<ChannelMessage>) {
        let (tx, rx) = mpsc::channel(buffer_size.max(1));
        let transport = Self {
            id: id.into(),
            sender: Mutex::new(Some(tx)),
        };
        (transport, rx)
    }

    /// Whether `dispose` has run
    pub fn is_disposed(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

#[async_trait]
impl ChannelTransport for MemoryTransport {
    fn id(&self) -> &str {
        &self.id
    }

    fn deliver(&self, message: ChannelMessage) -> AppResult<()> {
        let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(tx) = sender.as_ref() else {
            return Err(AppError::transport_delivery(format!(
                "Transport '{}' is disposed",
                self.id
            )));
        };

        match tx.try_send(message) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                warn!(transport_id = %self.id, "Transport buffer full, message dropped");
                Err(AppError::transport_delivery(format!(
                    "Transport '{}' buffer is full",
                    self.id
                )))
            }
            Err(TrySendError::Closed(_)) => Err(AppError::transport_delivery(format!(
                "Transport '{}' receiver is gone",
                self.id
            ))),
        }
    }

    async fn dispose(&self) {
        let taken = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if taken.is_some() {
            debug!(transport_id = %self.id, "Memory transport disposed");
        }
    }
}
