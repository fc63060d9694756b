//! Built-in handlers available to hook manifests.
//!
//! | name    | params                  | behavior                          |
//! |---------|-------------------------|-----------------------------------|
//! | `log`   | none                    | logs the event and payload        |
//! | `echo`  | none                    | returns the payload as output     |
//! | `delay` | `{ "ms": u64 }`         | sleeps, honoring cancellation     |
//! | `fail`  | `{ "message": string }` | always fails                      |

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::info;

use hookhub_hooks::{HandlerCatalog, HandlerError, HandlerResult, HookContext, HookError, HookHandler};

/// Catalog holding every built-in handler.
pub fn catalog() -> HandlerCatalog {
    let mut catalog = HandlerCatalog::new();
    catalog
        .register_handler("log", Arc::new(LogHandler))
        .register_handler("echo", Arc::new(EchoHandler))
        .register("delay", |params| {
            let params: DelayParams = parse_params("delay", params)?;
            let handler: Arc<dyn HookHandler> = Arc::new(DelayHandler {
                delay: Duration::from_millis(params.ms),
            });
            Ok(handler)
        })
        .register("fail", |params| {
            let params: FailParams = if params.is_null() {
                FailParams::default()
            } else {
                parse_params("fail", params)?
            };
            let handler: Arc<dyn HookHandler> = Arc::new(FailHandler {
                message: params.message,
            });
            Ok(handler)
        });
    catalog
}

fn parse_params<T: DeserializeOwned>(
    handler: &str,
    params: &serde_json::Value,
) -> Result<T, HookError> {
    serde_json::from_value(params.clone())
        .map_err(|e| HookError::invalid_spec(format!("'{handler}' params: {e}")))
}

#[derive(Debug, Deserialize)]
struct DelayParams {
    ms: u64,
}

#[derive(Debug, Deserialize)]
struct FailParams {
    #[serde(default = "default_fail_message")]
    message: String,
}

impl Default for FailParams {
    fn default() -> Self {
        Self {
            message: default_fail_message(),
        }
    }
}

fn default_fail_message() -> String {
    "failed on purpose".to_string()
}

#[derive(Debug)]
struct LogHandler;

#[async_trait]
impl HookHandler for LogHandler {
    async fn handle(&self, ctx: &HookContext) -> HandlerResult {
        info!(
            hook_id = %ctx.hook_id,
            event = %ctx.event,
            payload = %ctx.payload.to_json(),
            "Event received"
        );
        Ok(None)
    }

    fn name(&self) -> &str {
        "log"
    }
}

#[derive(Debug)]
struct EchoHandler;

#[async_trait]
impl HookHandler for EchoHandler {
    async fn handle(&self, ctx: &HookContext) -> HandlerResult {
        Ok(Some(ctx.payload.to_json()))
    }

    fn name(&self) -> &str {
        "echo"
    }
}

#[derive(Debug)]
struct DelayHandler {
    delay: Duration,
}

#[async_trait]
impl HookHandler for DelayHandler {
    async fn handle(&self, ctx: &HookContext) -> HandlerResult {
        tokio::select! {
            _ = tokio::time::sleep(self.delay) => {
                let slept_ms = u64::try_from(self.delay.as_millis()).unwrap_or(u64::MAX);
                Ok(Some(serde_json::json!({ "slept_ms": slept_ms })))
            }
            _ = ctx.cancel.cancelled() => Err(HandlerError::new("cancelled")),
        }
    }

    fn name(&self) -> &str {
        "delay"
    }
}

#[derive(Debug)]
struct FailHandler {
    message: String,
}

#[async_trait]
impl HookHandler for FailHandler {
    async fn handle(&self, _ctx: &HookContext) -> HandlerResult {
        Err(HandlerError::new(self.message.clone()))
    }

    fn name(&self) -> &str {
        "fail"
    }
}
