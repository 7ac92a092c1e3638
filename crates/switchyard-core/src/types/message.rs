//! Message envelope handed from a channel to its transport.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A value queued on a channel, ready for a transport to deliver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelMessage {
    /// Unique message ID.
    pub id: Uuid,
    /// Channel the message was queued on.
    pub channel_id: String,
    /// Routing hint interpreted by the transport or client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Application payload.
    pub payload: serde_json::Value,
    /// When the message was queued.
    pub timestamp: DateTime<Utc>,
}

impl ChannelMessage {
    /// Creates a message stamped with a fresh ID and the current time.
    pub fn new(
        channel_id: impl Into<String>,
        payload: serde_json::Value,
        path: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            channel_id: channel_id.into(),
            path,
            payload,
            timestamp: Utc::now(),
        }
    }

    /// Serializes the message to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
