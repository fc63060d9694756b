//! `hookhub check`: validate configuration and every hook manifest.

use clap::Args;
use serde::Serialize;

use crate::builtins;
use crate::output::{self, OutputFormat};
use hookhub_core::config::AppConfig;
use hookhub_core::error::AppError;
use hookhub_hooks::HookSystem;

/// Arguments for the check command
#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Keep going after the first invalid hook spec
    #[arg(long)]
    pub all: bool,
}

/// Result of checking one hook spec
#[derive(Debug, Serialize)]
struct SpecCheck {
    index: usize,
    event: String,
    handler: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    problem: Option<String>,
}

/// Execute the check command
pub async fn execute(args: &CheckArgs, config: &AppConfig, format: OutputFormat) -> Result<(), AppError> {
    let specs = config.load_hook_specs()?;
    if !config.hooks.auto_load_config {
        output::print_warning("auto_load_config is off; no manifests were read");
    }

    // Register into a scratch system so id collisions surface too.
    let catalog = builtins::catalog();
    let scratch = HookSystem::new(config.hooks.clone())?;

    let mut checks = Vec::with_capacity(specs.len());
    for (index, spec) in specs.iter().enumerate() {
        let problem = match catalog.resolve(spec) {
            Ok(registration) => scratch.register(registration).await.err(),
            Err(e) => Some(e),
        };
        let failed = problem.is_some();
        checks.push(SpecCheck {
            index,
            event: spec.event.clone(),
            handler: spec.handler.clone(),
            problem: problem.map(|e| e.to_string()),
        });
        if failed && !args.all {
            break;
        }
    }

    let invalid = checks.iter().filter(|c| c.problem.is_some()).count();

    match format {
        OutputFormat::Json => output::print_item(
            &serde_json::json!({ "options": config.hooks, "specs": checks }),
            format,
        ),
        OutputFormat::Table => {
            output::print_kv("Default timeout", &format!("{}ms", config.hooks.default_timeout_ms));
            output::print_kv("Continue on error", &config.hooks.continue_on_error.to_string());
            output::print_kv("Max concurrent", &config.hooks.max_concurrent.to_string());
            for check in &checks {
                let name = format!("#{} {} -> {}", check.index, check.event, check.handler);
                match &check.problem {
                    Some(problem) => output::print_error(&format!("{name}: {problem}")),
                    None => output::print_success(&name),
                }
            }
        }
    }

    if invalid > 0 {
        return Err(AppError::validation(format!("{invalid} invalid hook spec(s)")));
    }

    if format == OutputFormat::Table {
        output::print_success(&format!("{} hook spec(s) valid", specs.len()));
    }
    Ok(())
}
