//! Registry-management errors.
//!
//! Invocation failures are never errors at this level: they are recorded
//! as [`OutcomeStatus`](crate::definitions::OutcomeStatus) data.

use thiserror::Error;

use hookhub_core::error::AppError;
use hookhub_core::types::id::HookId;

/// Errors returned synchronously by hook-system management operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HookError {
    /// No hook with this id is registered.
    #[error("Hook '{id}' not found")]
    NotFound {
        /// The unknown id.
        id: HookId,
    },

    /// A caller-supplied id collides with a registered hook.
    #[error("Hook id '{id}' is already registered")]
    DuplicateHandler {
        /// The colliding id.
        id: HookId,
    },

    /// The catalog has no handler factory under this name.
    #[error("No handler named '{name}' in catalog")]
    UnknownHandler {
        /// The requested handler name.
        name: String,
    },

    /// A hook spec or handler parameters were rejected.
    #[error("Invalid hook spec: {reason}")]
    InvalidSpec {
        /// What was wrong.
        reason: String,
    },

    /// Dispatch options failed validation.
    #[error("Invalid hook system options: {reason}")]
    InvalidOptions {
        /// What was wrong.
        reason: String,
    },
}

impl HookError {
    /// Creates an invalid-spec error.
    pub fn invalid_spec(reason: impl Into<String>) -> Self {
        Self::InvalidSpec {
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code used in control-surface envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::DuplicateHandler { .. } => "DUPLICATE_HANDLER",
            Self::UnknownHandler { .. } => "UNKNOWN_HANDLER",
            Self::InvalidSpec { .. } => "INVALID_SPEC",
            Self::InvalidOptions { .. } => "INVALID_OPTIONS",
        }
    }
}

impl From<HookError> for AppError {
    fn from(err: HookError) -> Self {
        match &err {
            HookError::NotFound { .. } => AppError::not_found(err.to_string()),
            HookError::DuplicateHandler { .. } => AppError::conflict(err.to_string()),
            HookError::UnknownHandler { .. }
            | HookError::InvalidSpec { .. }
            | HookError::InvalidOptions { .. } => AppError::validation(err.to_string()),
        }
    }
}
