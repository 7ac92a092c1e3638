//! Unified error types for Switchyard.
//!
//! Every fallible channel, registry, and transport operation reports an
//! [`AppError`]. The [`ErrorKind`] is what callers match on; the message is
//! for humans and logs.

use std::fmt;
use thiserror::Error;

/// Error categories surfaced by the channel core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// No channel is registered under the requested id.
    UnknownChannel,
    /// The channel exists but no transport is registered for its id.
    TransportUnavailable,
    /// The channel has been closed.
    ChannelClosed,
    /// A live channel already holds the requested id.
    ChannelExists,
    /// A new-channel listener or subscription handler failed.
    ListenerFailed,
    /// A transport factory failed to construct a transport.
    TransportFactory,
    /// A transport refused a message.
    TransportDelivery,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An internal invariant was violated.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownChannel => write!(f, "UNKNOWN_CHANNEL"),
            Self::TransportUnavailable => write!(f, "TRANSPORT_UNAVAILABLE"),
            Self::ChannelClosed => write!(f, "CHANNEL_CLOSED"),
            Self::ChannelExists => write!(f, "CHANNEL_EXISTS"),
            Self::ListenerFailed => write!(f, "LISTENER_FAILED"),
            Self::TransportFactory => write!(f, "TRANSPORT_FACTORY"),
            Self::TransportDelivery => write!(f, "TRANSPORT_DELIVERY"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The unified error used throughout Switchyard.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an unknown-channel error for `channel_id`.
    pub fn unknown_channel(channel_id: &str) -> Self {
        Self::new(
            ErrorKind::UnknownChannel,
            format!("Invalid channel id '{channel_id}'"),
        )
    }

    /// Create a transport-unavailable error for `channel_id`.
    pub fn transport_unavailable(channel_id: &str) -> Self {
        Self::new(
            ErrorKind::TransportUnavailable,
            format!("No transport registered for channel '{channel_id}'"),
        )
    }

    /// Create a channel-closed error for `channel_id`.
    pub fn channel_closed(channel_id: &str) -> Self {
        Self::new(
            ErrorKind::ChannelClosed,
            format!("Channel '{channel_id}' is closed"),
        )
    }

    /// Create a channel-exists error for `channel_id`.
    pub fn channel_exists(channel_id: &str) -> Self {
        Self::new(
            ErrorKind::ChannelExists,
            format!("Channel '{channel_id}' already exists"),
        )
    }

    /// Create a listener failure.
    pub fn listener_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ListenerFailed, message)
    }

    /// Create a transport factory failure.
    pub fn transport_factory(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TransportFactory, message)
    }

    /// Create a transport delivery failure.
    pub fn transport_delivery(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TransportDelivery, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Returns whether this error is of the given kind.
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}
