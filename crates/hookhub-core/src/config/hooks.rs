//! Hook system configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::types::id::HookId;

/// Dispatch policy for the hook system.
///
/// A value of this type is an immutable snapshot: the hook system swaps
/// whole snapshots and never mutates one in place.
#[derive(Debug, Clone, PartialEq, Eq, Validate, Serialize, Deserialize)]
pub struct HookSystemOptions {
    /// Hook manifest files to read when `auto_load_config` is set.
    #[serde(default = "default_config_paths")]
    pub config_paths: Vec<PathBuf>,
    /// Whether manifests are loaded at startup.
    #[serde(default = "default_true")]
    pub auto_load_config: bool,
    /// Per-invocation deadline in milliseconds when a hook has no override.
    #[serde(default = "default_timeout_ms")]
    #[validate(range(min = 1))]
    pub default_timeout_ms: u64,
    /// Whether a failing hook lets the rest of the same emit proceed.
    #[serde(default = "default_true")]
    pub continue_on_error: bool,
    /// Global cap on simultaneously running invocations across all events.
    #[serde(default = "default_max_concurrent")]
    #[validate(range(min = 1))]
    pub max_concurrent: usize,
}

impl HookSystemOptions {
    /// Default per-invocation deadline.
    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }

    /// Set the default timeout.
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the continue-on-error policy.
    pub fn with_continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }

    /// Set the global concurrency limit.
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent;
        self
    }
}

impl Default for HookSystemOptions {
    fn default() -> Self {
        Self {
            config_paths: default_config_paths(),
            auto_load_config: true,
            default_timeout_ms: default_timeout_ms(),
            continue_on_error: true,
            max_concurrent: default_max_concurrent(),
        }
    }
}

/// Serializable description of one hook, as found in manifests and
/// control requests. The handler is referenced by catalog name.
#[derive(Debug, Clone, PartialEq, Validate, Serialize, Deserialize)]
pub struct HookSpec {
    /// Caller-chosen id; a fresh one is generated when absent.
    #[serde(default)]
    pub id: Option<HookId>,
    /// Event name the hook subscribes to.
    #[validate(length(min = 1))]
    pub event: String,
    /// Name of the handler factory in the catalog.
    #[validate(length(min = 1))]
    pub handler: String,
    /// Execution priority (lower runs first).
    #[serde(default = "default_priority")]
    pub priority: i32,
    /// Whether the hook starts enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Per-hook deadline override in milliseconds.
    #[serde(default)]
    #[validate(range(min = 1))]
    pub timeout_ms: Option<u64>,
    /// Display label; defaults to the handler name.
    #[serde(default)]
    pub label: Option<String>,
    /// Handler-specific parameters passed to the factory.
    #[serde(default)]
    pub params: serde_json::Value,
}

impl HookSpec {
    /// Creates a spec with default priority and no parameters.
    pub fn new(event: impl Into<String>, handler: impl Into<String>) -> Self {
        Self {
            id: None,
            event: event.into(),
            handler: handler.into(),
            priority: default_priority(),
            enabled: true,
            timeout_ms: None,
            label: None,
            params: serde_json::Value::Null,
        }
    }

    /// Sets the priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the handler parameters.
    pub fn with_params(mut self, params: serde_json::Value) -> Self {
        self.params = params;
        self
    }

    /// Sets a caller-chosen id.
    pub fn with_id(mut self, id: HookId) -> Self {
        self.id = Some(id);
        self
    }
}

/// Default priority for hooks that don't specify one.
pub const DEFAULT_PRIORITY: i32 = 100;

fn default_priority() -> i32 {
    DEFAULT_PRIORITY
}

fn default_config_paths() -> Vec<PathBuf> {
    vec![PathBuf::from("config/hooks.toml")]
}

fn default_timeout_ms() -> u64 {
    5_000
}

fn default_max_concurrent() -> usize {
    10
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let options = HookSystemOptions::default();
        assert!(options.validate().is_ok());
        assert_eq!(options.default_timeout(), Duration::from_secs(5));
        assert!(options.continue_on_error);
    }

    #[test]
    fn test_zero_limits_rejected() {
        let options = HookSystemOptions::default().with_max_concurrent(0);
        assert!(options.validate().is_err());

        let options = HookSystemOptions {
            default_timeout_ms: 0,
            ..HookSystemOptions::default()
        };
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_spec_defaults_from_json() {
        let spec: HookSpec =
            serde_json::from_value(serde_json::json!({"event": "app_start", "handler": "log"}))
                .expect("deserialize");
        assert_eq!(spec.priority, DEFAULT_PRIORITY);
        assert!(spec.enabled);
        assert!(spec.id.is_none());
        assert!(spec.params.is_null());
    }

    #[test]
    fn test_spec_rejects_empty_handler() {
        let spec = HookSpec::new("app_start", "");
        assert!(spec.validate().is_err());
    }
}
