//! Invocation runner: executes one handler under a deadline and turns
//! whatever happens into an [`InvocationOutcome`].

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::definitions::{EventPayload, HookEvent, InvocationOutcome, OutcomeStatus};
use crate::handler::HookContext;
use crate::registry::HookDefinition;

/// Runs single hook invocations.
///
/// On timeout the context's cancellation token is triggered and the
/// handler future is dropped. Work the handler handed off elsewhere (a
/// spawned task, a blocking thread) keeps running unless it watches the
/// token; its result is discarded either way.
#[derive(Debug, Clone, Copy, Default)]
pub struct InvocationRunner;

impl InvocationRunner {
    /// Creates a runner.
    pub fn new() -> Self {
        Self
    }

    /// Executes `hook` once. Never fails: errors, panics, and timeouts are
    /// all reported in the returned outcome.
    pub async fn run(
        &self,
        hook: &HookDefinition,
        event: &HookEvent,
        payload: Arc<EventPayload>,
        default_timeout: Duration,
    ) -> InvocationOutcome {
        let deadline = hook.timeout(default_timeout);
        let cancel = CancellationToken::new();
        let ctx = HookContext {
            hook_id: hook.id,
            event: event.clone(),
            payload,
            cancel: cancel.clone(),
        };

        debug!(hook_id = %hook.id, event = %event, label = %hook.label, "Invoking hook");

        let started_at = Utc::now();
        let start = Instant::now();
        // Calling `handle` inside the guarded future covers handlers that
        // panic before returning their future.
        let call = AssertUnwindSafe(async { hook.handler.handle(&ctx).await }).catch_unwind();

        let (status, output, detail) = match tokio::time::timeout(deadline, call).await {
            Ok(Ok(Ok(output))) => (OutcomeStatus::Succeeded, output, None),
            Ok(Ok(Err(err))) => {
                warn!(
                    hook_id = %hook.id,
                    event = %event,
                    label = %hook.label,
                    error = %err,
                    "Hook handler failed"
                );
                (OutcomeStatus::Failed, None, Some(err.to_string()))
            }
            Ok(Err(panic)) => {
                let message = panic_message(panic.as_ref());
                error!(
                    hook_id = %hook.id,
                    event = %event,
                    label = %hook.label,
                    panic = %message,
                    "Hook handler panicked"
                );
                (
                    OutcomeStatus::Failed,
                    None,
                    Some(format!("handler panicked: {message}")),
                )
            }
            Err(_) => {
                cancel.cancel();
                warn!(
                    hook_id = %hook.id,
                    event = %event,
                    label = %hook.label,
                    timeout_ms = u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
                    "Hook handler timed out"
                );
                (
                    OutcomeStatus::TimedOut,
                    None,
                    Some(format!("timed out after {}ms", deadline.as_millis())),
                )
            }
        };

        let duration = start.elapsed();
        debug!(
            hook_id = %hook.id,
            status = %status,
            duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            "Hook invocation settled"
        );

        InvocationOutcome {
            hook_id: hook.id,
            label: hook.label.clone(),
            event: event.clone(),
            status,
            duration,
            started_at,
            output,
            error: detail,
        }
    }
}

/// Best-effort text of a panic payload.
fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
