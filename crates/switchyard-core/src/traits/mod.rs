//! Core traits defined in `switchyard-core` and implemented by other crates.

pub mod transport;

pub use transport::ChannelTransport;
