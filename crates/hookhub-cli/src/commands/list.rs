//! `hookhub list`: show the hooks loaded from the configured manifests.

use clap::Args;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use hookhub_core::config::AppConfig;
use hookhub_core::error::AppError;
use hookhub_hooks::{HookEvent, HookSummary};

/// Arguments for the list command
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Only list hooks for this event
    #[arg(long)]
    pub event: Option<String>,
}

/// A registered hook as a table row
#[derive(Debug, Tabled)]
struct HookRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Event")]
    event: String,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Handler")]
    handler: String,
    #[tabled(rename = "Priority")]
    priority: i32,
    #[tabled(rename = "Enabled")]
    enabled: bool,
    #[tabled(rename = "Timeout")]
    timeout: String,
}

impl From<&HookSummary> for HookRow {
    fn from(summary: &HookSummary) -> Self {
        Self {
            id: summary.id.to_string(),
            event: summary.event.clone(),
            label: summary.label.clone(),
            handler: summary.handler.clone(),
            priority: summary.priority,
            enabled: summary.enabled,
            timeout: summary
                .timeout_ms
                .map(|ms| format!("{ms}ms"))
                .unwrap_or_else(|| "default".to_string()),
        }
    }
}

/// Execute the list command
pub async fn execute(args: &ListArgs, config: &AppConfig, format: OutputFormat) -> Result<(), AppError> {
    let system = super::build_system(config).await?;

    let event = args.event.as_deref().map(HookEvent::parse);
    let summaries: Vec<HookSummary> = system
        .list(event.as_ref())
        .await
        .iter()
        .map(|hook| hook.summary())
        .collect();
    let rows: Vec<HookRow> = summaries.iter().map(HookRow::from).collect();

    output::print_rows(&rows, &summaries, format);
    Ok(())
}
