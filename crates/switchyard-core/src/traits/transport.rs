//! Transport trait for pluggable connection mechanisms.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::ChannelMessage;

/// A connection to one remote endpoint (WebSocket, long-poll, SSE, ...).
///
/// The registry owns transports by id and guarantees that at most one is
/// installed per id, and that a replaced transport is disposed exactly once.
#[async_trait]
pub trait ChannelTransport: Send + Sync + std::fmt::Debug + 'static {
    /// Identifier of the remote endpoint this transport serves.
    fn id(&self) -> &str;

    /// Hands a message to the transport for delivery.
    ///
    /// Must not wait for the remote side. Successive calls on the same
    /// transport must be delivered in call order.
    fn deliver(&self, message: ChannelMessage) -> AppResult<()>;

    /// Releases the underlying connection resources.
    async fn dispose(&self);
}
