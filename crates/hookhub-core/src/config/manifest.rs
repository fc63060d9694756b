//! Hook manifest files.
//!
//! A manifest is a TOML (or any format the `config` crate understands)
//! document with a `[[hooks]]` array of [`HookSpec`] entries.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use validator::Validate;

use super::hooks::HookSpec;
use crate::error::AppError;

/// Parsed contents of one manifest file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HookManifest {
    /// Hook specs in file order.
    #[serde(default)]
    pub hooks: Vec<HookSpec>,
}

impl HookManifest {
    /// Load and validate a single manifest file.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let manifest: HookManifest = config::Config::builder()
            .add_source(config::File::from(path))
            .build()
            .map_err(|e| {
                AppError::configuration(format!(
                    "Failed to read hook manifest '{}': {e}",
                    path.display()
                ))
            })?
            .try_deserialize()
            .map_err(|e| {
                AppError::configuration(format!(
                    "Failed to parse hook manifest '{}': {e}",
                    path.display()
                ))
            })?;

        for spec in &manifest.hooks {
            spec.validate().map_err(|e| {
                AppError::validation(format!(
                    "Invalid hook '{}' in '{}': {e}",
                    spec.handler,
                    path.display()
                ))
            })?;
        }

        debug!(path = %path.display(), hooks = manifest.hooks.len(), "Loaded hook manifest");
        Ok(manifest)
    }

    /// Load every manifest in order and concatenate their specs.
    ///
    /// Paths that do not exist are skipped with a warning so that the
    /// default manifest location can be absent.
    pub fn load_all(paths: &[PathBuf]) -> Result<Vec<HookSpec>, AppError> {
        let mut specs = Vec::new();
        for path in paths {
            if !path.exists() {
                warn!(path = %path.display(), "Hook manifest not found, skipping");
                continue;
            }
            specs.extend(Self::load(path)?.hooks);
        }
        Ok(specs)
    }
}
