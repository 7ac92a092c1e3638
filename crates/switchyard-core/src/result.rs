//! Convenience result type alias for Switchyard.

use crate::error::AppError;

/// A specialized `Result` type for Switchyard operations.
pub type AppResult<T> = Result<T, AppError>;
