//! Core type definitions used across the Switchyard workspace.

pub mod message;

pub use message::ChannelMessage;
