//! # switchyard-core
//!
//! Core crate for Switchyard. Contains the unified error system,
//! configuration schemas, the pluggable transport trait, and the
//! message envelope handed to transports.
//!
//! This crate has **no** internal dependencies on other Switchyard crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
pub use traits::ChannelTransport;
pub use types::ChannelMessage;
