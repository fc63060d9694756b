//! Control surface: serializable requests against a [`HookSystem`],
//! answered with [`ApiResponse`] envelopes.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use hookhub_core::config::{HookSpec, HookSystemOptions};
use hookhub_core::error::ErrorKind;
use hookhub_core::types::id::HookId;
use hookhub_core::types::response::ApiResponse;

use crate::catalog::HandlerCatalog;
use crate::definitions::{EventPayload, HookEvent};
use crate::error::HookError;
use crate::registry::HookSummary;
use crate::system::HookSystem;

/// Error code for requests that could not be parsed.
pub const INVALID_REQUEST: &str = "INVALID_REQUEST";

/// A control operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ControlRequest {
    /// Register a hook described by a spec.
    Register {
        /// The hook to register.
        spec: HookSpec,
    },
    /// Remove a hook.
    Unregister {
        /// Hook id.
        id: HookId,
    },
    /// Enable or disable a hook.
    SetEnabled {
        /// Hook id.
        id: HookId,
        /// New state.
        enabled: bool,
    },
    /// Fire an event.
    Emit {
        /// Event name.
        event: String,
        /// Payload; objects become the data map.
        #[serde(default)]
        payload: serde_json::Value,
    },
    /// Read statistics.
    GetStats,
    /// List hooks, optionally for one event.
    List {
        /// Event name filter.
        #[serde(default)]
        event: Option<String>,
    },
    /// Zero the statistics counters.
    ResetStats,
    /// Replace the dispatch options wholesale.
    Configure {
        /// The new options.
        options: HookSystemOptions,
    },
}

impl ControlRequest {
    /// Operation name, as it appears in the `op` tag.
    pub fn op(&self) -> &'static str {
        match self {
            Self::Register { .. } => "register",
            Self::Unregister { .. } => "unregister",
            Self::SetEnabled { .. } => "set_enabled",
            Self::Emit { .. } => "emit",
            Self::GetStats => "get_stats",
            Self::List { .. } => "list",
            Self::ResetStats => "reset_stats",
            Self::Configure { .. } => "configure",
        }
    }
}

/// Answers control requests for one hook system.
#[derive(Debug, Clone)]
pub struct HookControl {
    system: Arc<HookSystem>,
    catalog: Arc<HandlerCatalog>,
}

impl HookControl {
    /// Creates a control surface. `catalog` resolves `register` specs.
    pub fn new(system: Arc<HookSystem>, catalog: Arc<HandlerCatalog>) -> Self {
        Self { system, catalog }
    }

    /// The controlled hook system.
    pub fn system(&self) -> &Arc<HookSystem> {
        &self.system
    }

    /// Parses a JSON request and handles it.
    pub async fn handle_json(&self, request: &str) -> ApiResponse {
        match serde_json::from_str::<ControlRequest>(request) {
            Ok(request) => self.handle(request).await,
            Err(e) => {
                warn!(error = %e, "Rejected malformed control request");
                ApiResponse::failure(INVALID_REQUEST, format!("Malformed request: {e}"))
            }
        }
    }

    /// Handles one request. Hook-system errors become failed envelopes
    /// carrying the error code; invocation failures are report data.
    pub async fn handle(&self, request: ControlRequest) -> ApiResponse {
        let op = request.op();
        debug!(op, "Handling control request");

        match self.execute(request).await {
            Ok(response) => response,
            Err(err) => {
                warn!(op, code = err.code(), error = %err, "Control request failed");
                ApiResponse::failure(err.code(), err.to_string())
            }
        }
    }

    async fn execute(&self, request: ControlRequest) -> Result<ApiResponse, HookError> {
        let response = match request {
            ControlRequest::Register { spec } => {
                let registration = self.catalog.resolve(&spec)?;
                let id = self.system.register(registration).await?;
                data(&serde_json::json!({ "id": id })).with_message("Hook registered")
            }
            ControlRequest::Unregister { id } => {
                self.system.unregister(id).await?;
                ApiResponse::empty().with_message("Hook unregistered")
            }
            ControlRequest::SetEnabled { id, enabled } => {
                self.system.set_enabled(id, enabled).await?;
                ApiResponse::empty().with_message(if enabled {
                    "Hook enabled"
                } else {
                    "Hook disabled"
                })
            }
            ControlRequest::Emit { event, payload } => {
                let report = self
                    .system
                    .emit(event, EventPayload::from_json(payload))
                    .await;
                data(&report)
            }
            ControlRequest::GetStats => data(&self.system.get_stats().await),
            ControlRequest::List { event } => {
                let event = event.map(HookEvent::from);
                let hooks: Vec<HookSummary> = self
                    .system
                    .list(event.as_ref())
                    .await
                    .iter()
                    .map(|hook| hook.summary())
                    .collect();
                data(&hooks)
            }
            ControlRequest::ResetStats => {
                self.system.reset_stats();
                ApiResponse::empty().with_message("Statistics reset")
            }
            ControlRequest::Configure { options } => {
                self.system.configure(options).await?;
                ApiResponse::empty().with_message("Options updated")
            }
        };
        Ok(response)
    }
}

/// Successful envelope carrying `value`.
fn data<T: Serialize>(value: &T) -> ApiResponse {
    match serde_json::to_value(value) {
        Ok(value) => ApiResponse::ok(value),
        Err(e) => ApiResponse::failure(
            ErrorKind::Serialization.to_string(),
            format!("Failed to serialize response: {e}"),
        ),
    }
}
