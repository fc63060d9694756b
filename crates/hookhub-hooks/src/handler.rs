//! Handler trait and closure adapter.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use hookhub_core::error::AppError;
use hookhub_core::types::id::HookId;

use crate::definitions::{EventPayload, HookEvent};

/// Everything a handler sees for one invocation.
#[derive(Debug, Clone)]
pub struct HookContext {
    /// The hook being invoked.
    pub hook_id: HookId,
    /// The emitted event.
    pub event: HookEvent,
    /// The shared, immutable payload.
    pub payload: Arc<EventPayload>,
    /// Triggered when the invocation deadline elapses.
    pub cancel: CancellationToken,
}

impl HookContext {
    /// Whether the invocation has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Failure reported by a handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    /// Creates a handler error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The failure message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(format!("JSON error: {err}"))
    }
}

impl From<AppError> for HandlerError {
    fn from(err: AppError) -> Self {
        Self::new(err.to_string())
    }
}

/// Result of a handler: optional output on success.
pub type HandlerResult = Result<Option<serde_json::Value>, HandlerError>;

/// A hook handler. Must be safe to call repeatedly and concurrently.
#[async_trait]
pub trait HookHandler: Send + Sync + std::fmt::Debug {
    /// Handles one invocation.
    async fn handle(&self, ctx: &HookContext) -> HandlerResult;

    /// Name used in logs and listings.
    fn name(&self) -> &str {
        "anonymous"
    }
}

type BoxedHandlerFn = dyn Fn(HookContext) -> BoxFuture<'static, HandlerResult> + Send + Sync;

/// A closure-based hook handler for quick handler creation.
pub struct FnHandler {
    name: String,
    handler: Arc<BoxedHandlerFn>,
}

impl std::fmt::Debug for FnHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnHandler")
            .field("name", &self.name)
            .field("handler", &"<closure>")
            .finish()
    }
}

impl FnHandler {
    /// Creates a new closure-based handler.
    pub fn new<F, Fut>(name: &str, handler: F) -> Self
    where
        F: Fn(HookContext) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = HandlerResult> + Send + 'static,
    {
        Self {
            name: name.to_string(),
            handler: Arc::new(move |ctx| -> BoxFuture<'static, HandlerResult> {
                Box::pin(handler(ctx))
            }),
        }
    }

    /// Creates a closure-based handler already wrapped for registration.
    pub fn arc<F, Fut>(name: &str, handler: F) -> Arc<dyn HookHandler>
    where
        F: Fn(HookContext) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = HandlerResult> + Send + 'static,
    {
        Arc::new(Self::new(name, handler))
    }
}

#[async_trait]
impl HookHandler for FnHandler {
    async fn handle(&self, ctx: &HookContext) -> HandlerResult {
        (self.handler)(ctx.clone()).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}
