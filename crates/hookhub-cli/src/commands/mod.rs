//! CLI command definitions and dispatch.

pub mod check;
pub mod emit;
pub mod list;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;

use crate::builtins;
use crate::output::OutputFormat;
use hookhub_core::config::AppConfig;
use hookhub_core::error::AppError;
use hookhub_hooks::HookSystem;

/// HookHub: in-process hook system runner
#[derive(Debug, Parser)]
#[command(name = "hookhub", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Environment overlay (loads `config/<ENV>.toml` on top)
    #[arg(short, long)]
    pub env: Option<String>,

    /// Directory relative manifest paths are resolved against
    #[arg(long)]
    pub manifest_dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Emit an event to the configured hooks
    Emit(emit::EmitArgs),
    /// List configured hooks
    List(list::ListArgs),
    /// Validate configuration and hook manifests
    Check(check::CheckArgs),
}

impl Cli {
    /// Load configuration from the selected file and overlay.
    pub fn load_config(&self) -> Result<AppConfig, AppError> {
        let mut config = AppConfig::load(&self.config, self.env.as_deref())?;
        if let Some(dir) = &self.manifest_dir {
            config.rebase_config_paths(dir);
        }
        Ok(config)
    }

    /// Execute the CLI command
    pub async fn execute(&self, config: AppConfig) -> Result<(), AppError> {
        match &self.command {
            Commands::Emit(args) => emit::execute(args, &config, self.format).await,
            Commands::List(args) => list::execute(args, &config, self.format).await,
            Commands::Check(args) => check::execute(args, &config, self.format).await,
        }
    }
}

/// Helper: build a hook system populated from the configured manifests.
pub async fn build_system(config: &AppConfig) -> Result<HookSystem, AppError> {
    let catalog = builtins::catalog();
    let system = HookSystem::new(config.hooks.clone())?;

    let specs = config.load_hook_specs()?;
    let ids = system.load_specs(&catalog, &specs).await?;
    info!(hooks = ids.len(), "Hook system ready");

    Ok(system)
}
