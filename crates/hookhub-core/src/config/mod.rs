//! Application configuration schemas.
//!
//! Configuration is deserialized from TOML files and `HOOKHUB__*`
//! environment variables via the `config` crate. Each sub-module
//! represents a logical configuration section.

pub mod hooks;
pub mod logging;
pub mod manifest;

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;
use validator::Validate;

pub use self::hooks::{DEFAULT_PRIORITY, HookSpec, HookSystemOptions};
pub use self::logging::LoggingConfig;
pub use self::manifest::HookManifest;

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Hook system dispatch policy.
    #[serde(default)]
    pub hooks: HookSystemOptions,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a file plus an optional environment overlay.
    ///
    /// `path` may be missing, in which case defaults apply. When `env` is
    /// given, `config/{env}.toml` is layered on top. Environment variables
    /// prefixed with `HOOKHUB__` win over both (e.g.
    /// `HOOKHUB__HOOKS__MAX_CONCURRENT=4`).
    pub fn load(path: &str, env: Option<&str>) -> Result<Self, AppError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name(path).required(false));

        if let Some(env) = env {
            builder = builder
                .add_source(config::File::with_name(&format!("config/{env}")).required(false));
        }

        let config: AppConfig = builder
            .add_source(
                config::Environment::with_prefix("HOOKHUB")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("hooks.config_paths"),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        config.hooks.validate()?;
        debug!(path, ?env, "Configuration loaded");
        Ok(config)
    }

    /// Load the hook specs named by `hooks.config_paths`.
    ///
    /// Returns an empty list when `auto_load_config` is off.
    pub fn load_hook_specs(&self) -> Result<Vec<HookSpec>, AppError> {
        if !self.hooks.auto_load_config {
            return Ok(Vec::new());
        }
        HookManifest::load_all(&self.hooks.config_paths)
    }

    /// Resolve manifest paths relative to a base directory.
    pub fn rebase_config_paths(&mut self, base: &Path) {
        for path in &mut self.hooks.config_paths {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}
