//! Handler catalog: named handler factories used to turn declarative
//! [`HookSpec`]s into registrations.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;
use validator::Validate;

use hookhub_core::config::HookSpec;

use crate::error::HookError;
use crate::handler::HookHandler;
use crate::registry::HookRegistration;

/// Builds a handler from a spec's `params`.
pub type HandlerFactory =
    dyn Fn(&serde_json::Value) -> Result<Arc<dyn HookHandler>, HookError> + Send + Sync;

/// Name → factory map.
#[derive(Default, Clone)]
pub struct HandlerCatalog {
    factories: HashMap<String, Arc<HandlerFactory>>,
}

impl std::fmt::Debug for HandlerCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerCatalog")
            .field("handlers", &self.names())
            .finish()
    }
}

impl HandlerCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory under `name`, replacing any previous one.
    pub fn register<F>(&mut self, name: &str, factory: F) -> &mut Self
    where
        F: Fn(&serde_json::Value) -> Result<Arc<dyn HookHandler>, HookError>
            + Send
            + Sync
            + 'static,
    {
        debug!(handler = %name, "Handler factory registered");
        self.factories.insert(name.to_string(), Arc::new(factory));
        self
    }

    /// Registers a parameterless handler instance under `name`.
    pub fn register_handler(&mut self, name: &str, handler: Arc<dyn HookHandler>) -> &mut Self {
        self.register(name, move |_params| Ok(Arc::clone(&handler)))
    }

    /// Whether a factory named `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered handler names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Builds a handler by name.
    pub fn build(
        &self,
        name: &str,
        params: &serde_json::Value,
    ) -> Result<Arc<dyn HookHandler>, HookError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| HookError::UnknownHandler {
                name: name.to_string(),
            })?;
        factory(params)
    }

    /// Validates `spec` and turns it into a registration.
    pub fn resolve(&self, spec: &HookSpec) -> Result<HookRegistration, HookError> {
        spec.validate()
            .map_err(|e| HookError::invalid_spec(e.to_string()))?;

        let handler = self.build(&spec.handler, &spec.params)?;
        let mut registration = HookRegistration::new(spec.event.as_str(), handler)
            .with_priority(spec.priority)
            .enabled(spec.enabled);

        if let Some(id) = spec.id {
            registration = registration.with_id(id);
        }
        if let Some(ms) = spec.timeout_ms {
            registration = registration.with_timeout(Duration::from_millis(ms));
        }
        if let Some(label) = &spec.label {
            registration = registration.with_label(label.clone());
        }

        Ok(registration)
    }
}
