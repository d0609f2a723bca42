//! Convenience result type alias for AskHub.

use crate::error::AppError;

/// A specialized `Result` type for AskHub operations.
pub type AppResult<T> = Result<T, AppError>;
