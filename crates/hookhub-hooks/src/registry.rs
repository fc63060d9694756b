//! Hook registry: hooks are kept per event, ordered by priority and then
//! by registration order.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::info;

use hookhub_core::config::DEFAULT_PRIORITY;
use hookhub_core::types::id::HookId;

use crate::definitions::HookEvent;
use crate::error::HookError;
use crate::handler::HookHandler;

/// A registered hook. Cloning is cheap: the handler is shared.
#[derive(Debug, Clone)]
pub struct HookDefinition {
    /// Unique id.
    pub id: HookId,
    /// Event the hook subscribes to.
    pub event: HookEvent,
    /// The handler.
    pub handler: Arc<dyn HookHandler>,
    /// Priority (lower = earlier start).
    pub priority: i32,
    /// Whether emits pick this hook up.
    pub enabled: bool,
    /// Deadline override; the system default applies when `None`.
    pub timeout_override: Option<Duration>,
    /// Display label.
    pub label: String,
}

impl HookDefinition {
    /// Effective deadline given the system default.
    pub fn timeout(&self, default: Duration) -> Duration {
        self.timeout_override.unwrap_or(default)
    }

    /// Serializable view of this hook.
    pub fn summary(&self) -> HookSummary {
        HookSummary {
            id: self.id,
            event: self.event.to_string(),
            label: self.label.clone(),
            handler: self.handler.name().to_string(),
            priority: self.priority,
            enabled: self.enabled,
            timeout_ms: self
                .timeout_override
                .map(|t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX)),
        }
    }
}

/// Serializable description of a registered hook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HookSummary {
    /// Hook id.
    pub id: HookId,
    /// Event name.
    pub event: String,
    /// Display label.
    pub label: String,
    /// Handler name.
    pub handler: String,
    /// Priority.
    pub priority: i32,
    /// Enabled flag.
    pub enabled: bool,
    /// Deadline override in milliseconds.
    pub timeout_ms: Option<u64>,
}

/// Input to [`HookRegistry::register`].
#[derive(Debug, Clone)]
pub struct HookRegistration {
    id: Option<HookId>,
    event: HookEvent,
    handler: Arc<dyn HookHandler>,
    priority: i32,
    enabled: bool,
    timeout_override: Option<Duration>,
    label: Option<String>,
}

impl HookRegistration {
    /// A registration with default priority, enabled, and no overrides.
    pub fn new(event: impl Into<HookEvent>, handler: Arc<dyn HookHandler>) -> Self {
        Self {
            id: None,
            event: event.into(),
            handler,
            priority: DEFAULT_PRIORITY,
            enabled: true,
            timeout_override: None,
            label: None,
        }
    }

    /// Use a caller-chosen id instead of a generated one.
    pub fn with_id(mut self, id: HookId) -> Self {
        self.id = Some(id);
        self
    }

    /// Set the priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Override the system default timeout for this hook.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_override = Some(timeout);
        self
    }

    /// Set the display label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the initial enabled state.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Event this registration targets.
    pub fn event(&self) -> &HookEvent {
        &self.event
    }
}

#[derive(Debug, Default)]
struct RegistryState {
    /// Event → hooks in start order.
    by_event: HashMap<HookEvent, Vec<HookDefinition>>,
    /// Hook id → event, for id lookups.
    index: HashMap<HookId, HookEvent>,
}

impl RegistryState {
    fn find_mut(&mut self, id: HookId) -> Option<&mut HookDefinition> {
        let event = self.index.get(&id)?;
        self.by_event.get_mut(event)?.iter_mut().find(|d| d.id == id)
    }
}

/// Registry of hooks organized by event.
#[derive(Debug, Default)]
pub struct HookRegistry {
    state: RwLock<RegistryState>,
}

impl HookRegistry {
    /// Creates a new empty hook registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a hook and returns its id.
    ///
    /// Fails with [`HookError::DuplicateHandler`] only when the registration
    /// carries an id that is already taken; the same handler may be
    /// registered any number of times under fresh ids.
    pub async fn register(&self, registration: HookRegistration) -> Result<HookId, HookError> {
        let mut state = self.state.write().await;

        let id = match registration.id {
            Some(id) if state.index.contains_key(&id) => {
                return Err(HookError::DuplicateHandler { id });
            }
            Some(id) => id,
            None => loop {
                let id = HookId::new();
                if !state.index.contains_key(&id) {
                    break id;
                }
            },
        };

        let label = registration
            .label
            .unwrap_or_else(|| registration.handler.name().to_string());
        let definition = HookDefinition {
            id,
            event: registration.event.clone(),
            handler: registration.handler,
            priority: registration.priority,
            enabled: registration.enabled,
            timeout_override: registration.timeout_override,
            label,
        };

        info!(
            hook_id = %id,
            event = %definition.event,
            label = %definition.label,
            priority = definition.priority,
            enabled = definition.enabled,
            "Hook registered"
        );

        state.index.insert(id, registration.event.clone());
        let entries = state.by_event.entry(registration.event).or_default();
        // Equal priorities keep registration order: insert after all peers.
        let position = entries.partition_point(|d| d.priority <= definition.priority);
        entries.insert(position, definition);

        Ok(id)
    }

    /// Removes a hook and returns its final definition.
    pub async fn unregister(&self, id: HookId) -> Result<HookDefinition, HookError> {
        let mut state = self.state.write().await;

        let event = state.index.remove(&id).ok_or(HookError::NotFound { id })?;
        let entries = state
            .by_event
            .get_mut(&event)
            .ok_or(HookError::NotFound { id })?;
        let position = entries
            .iter()
            .position(|d| d.id == id)
            .ok_or(HookError::NotFound { id })?;
        let removed = entries.remove(position);

        if entries.is_empty() {
            state.by_event.remove(&event);
        }

        info!(hook_id = %id, event = %event, "Hook unregistered");
        Ok(removed)
    }

    /// Enables or disables a hook. Returns the previous state.
    pub async fn set_enabled(&self, id: HookId, enabled: bool) -> Result<bool, HookError> {
        let mut state = self.state.write().await;
        let definition = state.find_mut(id).ok_or(HookError::NotFound { id })?;

        let previous = definition.enabled;
        definition.enabled = enabled;

        if previous != enabled {
            info!(hook_id = %id, enabled, "Hook enabled state changed");
        }
        Ok(previous)
    }

    /// Returns a copy of one hook.
    pub async fn get(&self, id: HookId) -> Option<HookDefinition> {
        let state = self.state.read().await;
        let event = state.index.get(&id)?;
        state
            .by_event
            .get(event)?
            .iter()
            .find(|d| d.id == id)
            .cloned()
    }

    /// Returns a snapshot of hooks in start order.
    ///
    /// With an event, only that event's hooks are listed. Without one,
    /// every hook is listed grouped by event name.
    pub async fn list(&self, event: Option<&HookEvent>) -> Vec<HookDefinition> {
        let state = self.state.read().await;
        match event {
            Some(event) => state
                .by_event
                .get(event)
                .cloned()
                .unwrap_or_default(),
            None => {
                let by_event = &state.by_event;
                let mut events: Vec<&HookEvent> = by_event.keys().collect();
                events.sort_by(|a, b| a.as_str().cmp(b.as_str()));
                events
                    .into_iter()
                    .flat_map(|event| by_event[event].iter().cloned())
                    .collect()
            }
        }
    }

    /// Snapshot of the enabled hooks for one event, in start order.
    pub async fn enabled_for(&self, event: &HookEvent) -> Vec<HookDefinition> {
        let state = self.state.read().await;
        state
            .by_event
            .get(event)
            .map(|entries| entries.iter().filter(|d| d.enabled).cloned().collect())
            .unwrap_or_default()
    }

    /// Returns `(hook_count, enabled_count)` read under one lock.
    pub async fn counts(&self) -> (usize, usize) {
        let state = self.state.read().await;
        let enabled = state
            .by_event
            .values()
            .flatten()
            .filter(|d| d.enabled)
            .count();
        (state.index.len(), enabled)
    }

    /// Returns all events with at least one hook.
    pub async fn events(&self) -> Vec<HookEvent> {
        let state = self.state.read().await;
        state.by_event.keys().cloned().collect()
    }
}
