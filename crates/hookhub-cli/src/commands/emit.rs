//! `hookhub emit`: fire an event at the configured hooks.

use clap::Args;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use hookhub_core::error::AppError;
use hookhub_hooks::{EmitReport, EventPayload};

/// Arguments for the emit command
#[derive(Debug, Args)]
pub struct EmitArgs {
    /// Event name (e.g. `app_start`, `before_tool_call`, or any custom name)
    pub event: String,

    /// JSON payload; objects become the event data map
    #[arg(short, long)]
    pub payload: Option<String>,

    /// Number of times to emit the event
    #[arg(short, long, default_value_t = 1)]
    pub repeat: u32,

    /// Print statistics after the last emit
    #[arg(long)]
    pub stats: bool,
}

/// One invocation outcome as a table row
#[derive(Debug, Tabled)]
struct OutcomeRow {
    #[tabled(rename = "Hook")]
    label: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Duration (ms)")]
    duration_ms: u128,
    #[tabled(rename = "Detail")]
    detail: String,
}

/// Execute the emit command
pub async fn execute(
    args: &EmitArgs,
    config: &hookhub_core::config::AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let data = match &args.payload {
        Some(raw) => serde_json::from_str(raw)
            .map_err(|e| AppError::validation(format!("Invalid --payload JSON: {e}")))?,
        None => serde_json::Value::Null,
    };

    let system = super::build_system(config).await?;

    for _ in 0..args.repeat {
        let payload = EventPayload::from_json(data.clone()).with_source("hookhub-cli");
        let report = system.emit(args.event.as_str(), payload).await;
        print_report(&report, format);
    }

    if args.stats {
        output::print_item(&system.get_stats().await, format);
    }

    Ok(())
}

fn print_report(report: &EmitReport, format: OutputFormat) {
    let rows: Vec<OutcomeRow> = report
        .outcomes
        .iter()
        .map(|o| OutcomeRow {
            label: o.label.clone(),
            status: o.status.to_string(),
            duration_ms: o.duration.as_millis(),
            detail: o
                .error
                .clone()
                .or_else(|| o.output.as_ref().map(|v| v.to_string()))
                .unwrap_or_default(),
        })
        .collect();

    output::print_rows(&rows, report, format);

    if format == OutputFormat::Table {
        if report.outcomes.is_empty() {
            output::print_warning(&format!("No enabled hooks for '{}'", report.event));
        } else if report.is_success() {
            output::print_success(&format!(
                "'{}' settled in {}ms",
                report.event,
                report.elapsed.as_millis()
            ));
        } else {
            output::print_warning(&format!(
                "'{}': {} succeeded, {} failed, {} skipped",
                report.event,
                report.succeeded(),
                report.failed(),
                report.skipped.len()
            ));
        }
    }
}
