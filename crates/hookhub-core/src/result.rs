//! Convenience result type alias for HookHub.

use crate::error::AppError;

/// A specialized `Result` type for HookHub operations.
pub type AppResult<T> = Result<T, AppError>;
