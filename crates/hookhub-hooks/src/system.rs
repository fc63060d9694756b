//! Hook system facade: the public entry point tying registry, scheduler,
//! and stats together.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};
use validator::Validate;

use hookhub_core::config::{HookSpec, HookSystemOptions};
use hookhub_core::types::id::HookId;

use crate::catalog::HandlerCatalog;
use crate::definitions::{EmitReport, EventPayload, HookEvent};
use crate::error::HookError;
use crate::registry::{HookDefinition, HookRegistration, HookRegistry};
use crate::runner::InvocationRunner;
use crate::scheduler::{ConcurrencyLimiter, DispatchPolicy, ExecutionScheduler};
use crate::stats::{HookStats, StatsAggregator};

/// An in-process hook system.
///
/// Owns its registry, policy, and counters; build one per process (or per
/// test) and share it behind an `Arc`.
#[derive(Debug)]
pub struct HookSystem {
    registry: HookRegistry,
    limiter: Arc<ConcurrencyLimiter>,
    policy: RwLock<Arc<DispatchPolicy>>,
    scheduler: ExecutionScheduler,
    stats: StatsAggregator,
}

impl HookSystem {
    /// Creates a hook system with validated options and no hooks.
    pub fn new(options: HookSystemOptions) -> Result<Self, HookError> {
        validate_options(&options)?;

        info!(
            default_timeout_ms = options.default_timeout_ms,
            continue_on_error = options.continue_on_error,
            max_concurrent = options.max_concurrent,
            "Hook system initialized"
        );

        let policy = DispatchPolicy::new(options);
        Ok(Self {
            registry: HookRegistry::new(),
            limiter: Arc::clone(&policy.limiter),
            policy: RwLock::new(Arc::new(policy)),
            scheduler: ExecutionScheduler::new(InvocationRunner::new()),
            stats: StatsAggregator::new(),
        })
    }

    /// Creates a hook system and registers `registrations` in order.
    pub async fn with_registrations(
        options: HookSystemOptions,
        registrations: impl IntoIterator<Item = HookRegistration>,
    ) -> Result<Self, HookError> {
        let system = Self::new(options)?;
        for registration in registrations {
            system.register(registration).await?;
        }
        Ok(system)
    }

    // ── Registry management ──────────────────────────────────────────

    /// Registers a hook and returns its id.
    pub async fn register(&self, registration: HookRegistration) -> Result<HookId, HookError> {
        let id = self.registry.register(registration).await?;
        self.stats.record_registration();
        Ok(id)
    }

    /// Removes a hook. Emits already in flight still run it.
    pub async fn unregister(&self, id: HookId) -> Result<(), HookError> {
        self.registry.unregister(id).await.map(|_| ())
    }

    /// Enables or disables a hook for future emits.
    pub async fn set_enabled(&self, id: HookId, enabled: bool) -> Result<(), HookError> {
        self.registry.set_enabled(id, enabled).await.map(|_| ())
    }

    /// Shorthand for `set_enabled(id, true)`.
    pub async fn enable(&self, id: HookId) -> Result<(), HookError> {
        self.set_enabled(id, true).await
    }

    /// Shorthand for `set_enabled(id, false)`.
    pub async fn disable(&self, id: HookId) -> Result<(), HookError> {
        self.set_enabled(id, false).await
    }

    /// Returns a copy of one hook.
    pub async fn get(&self, id: HookId) -> Option<HookDefinition> {
        self.registry.get(id).await
    }

    /// Snapshot of registered hooks, optionally for one event.
    pub async fn list(&self, event: Option<&HookEvent>) -> Vec<HookDefinition> {
        self.registry.list(event).await
    }

    /// Resolves `specs` through `catalog` and registers them in order.
    ///
    /// Stops at the first failure; hooks registered before it stay.
    pub async fn load_specs(
        &self,
        catalog: &HandlerCatalog,
        specs: &[HookSpec],
    ) -> Result<Vec<HookId>, HookError> {
        let mut ids = Vec::with_capacity(specs.len());
        for spec in specs {
            let registration = catalog.resolve(spec)?;
            ids.push(self.register(registration).await?);
        }

        info!(count = ids.len(), "Hook specs loaded");
        Ok(ids)
    }

    // ── Dispatch ─────────────────────────────────────────────────────

    /// Fires `event` and waits until every admitted hook settled.
    ///
    /// Invocation failures are reported in the returned report, never as
    /// errors. An event with no enabled hooks yields an empty report.
    pub async fn emit(&self, event: impl Into<HookEvent>, payload: EventPayload) -> EmitReport {
        let event = event.into();
        let hooks = self.registry.enabled_for(&event).await;

        if hooks.is_empty() {
            debug!(event = %event, "No enabled hooks for event");
            return EmitReport::empty(event);
        }

        let policy = Arc::clone(&*self.policy.read().await);
        self.scheduler
            .dispatch(&event, hooks, Arc::new(payload), policy, &self.stats)
            .await
    }

    // ── Stats ────────────────────────────────────────────────────────

    /// Current statistics, with live registry counts.
    pub async fn get_stats(&self) -> HookStats {
        let (hook_count, enabled_count) = self.registry.counts().await;
        self.stats.snapshot(hook_count, enabled_count)
    }

    /// Zeroes the cumulative counters. Registered hooks are untouched.
    pub fn reset_stats(&self) {
        self.stats.reset();
        info!("Hook statistics reset");
    }

    // ── Configuration ────────────────────────────────────────────────

    /// Replaces the dispatch policy. Emits already running keep their
    /// error policy and timeout; the concurrency limit is resized in place
    /// and binds every emit.
    pub async fn configure(&self, options: HookSystemOptions) -> Result<(), HookError> {
        validate_options(&options)?;

        info!(
            default_timeout_ms = options.default_timeout_ms,
            continue_on_error = options.continue_on_error,
            max_concurrent = options.max_concurrent,
            "Hook system reconfigured"
        );

        let mut policy = self.policy.write().await;
        *policy = Arc::new(DispatchPolicy::with_limiter(options, Arc::clone(&self.limiter)));
        Ok(())
    }

    /// The options currently in effect.
    pub async fn options(&self) -> HookSystemOptions {
        self.policy.read().await.options.clone()
    }
}

fn validate_options(options: &HookSystemOptions) -> Result<(), HookError> {
    options.validate().map_err(|e| HookError::InvalidOptions {
        reason: e.to_string(),
    })
}
