//! Output renderers and progress printing for CLI commands.
//!
//! Command results go to stdout; progress lines go to stderr so `--output json`
//! stays machine-readable.

use anyhow::anyhow;
use imgshift_config::MigrationConfig;
use imgshift_core::{ErrorDetail, ProgressSink, RecordOutcome, RunResult, ScanReport};
use imgshift_store::DEFAULT_ORDER;
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};

fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
    println!("{text}");
    Ok(())
}

pub(crate) fn render_run_result(result: &RunResult, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(result)?,
        OutputFormat::Table => {
            for line in run_summary_lines(result) {
                println!("{line}");
            }
        }
    }
    Ok(())
}

fn run_summary_lines(result: &RunResult) -> Vec<String> {
    let mut lines = Vec::new();
    if result.dry_run {
        lines.push("dry run: no uploads or writes were performed".to_string());
    }
    lines.push(format!("migrated: {}", result.migrated));
    lines.push(format!("skipped:  {}", result.skipped));
    lines.push(format!("errors:   {}", result.errors));
    lines.push(format!("total:    {}", result.total));
    lines.push(format!("batches:  {}", result.batches));
    if result.more_may_remain {
        lines.push("candidate cap reached; more records may remain, run again".to_string());
    }
    if !result.error_details.is_empty() {
        lines.push(String::new());
        lines.extend(error_table(&result.error_details));
    }
    lines
}

fn error_table(details: &[ErrorDetail]) -> Vec<String> {
    let mut lines = vec![format!("{:<12} {:<10} {:<24} MESSAGE", "RECORD", "STAGE", "NAME")];
    for detail in details {
        let name = if detail.name.is_empty() {
            "<unknown>"
        } else {
            detail.name.as_str()
        };
        lines.push(format!(
            "{:<12} {:<10} {:<24} {}",
            detail.record_id,
            detail.stage.as_str(),
            name,
            detail.message
        ));
    }
    lines
}

pub(crate) fn render_scan_report(report: &ScanReport, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(report)?,
        OutputFormat::Table => {
            println!("{:<18} COUNT", "DECISION");
            println!("{:<18} {}", "migrate", report.migratable);
            println!("{:<18} {}", "already migrated", report.already_migrated);
            println!("{:<18} {}", "not inline", report.not_inline);
            println!("{:<18} {}", "no image", report.absent);
            if report.unreadable > 0 {
                println!("{:<18} {}", "unreadable", report.unreadable);
            }
            println!("{:<18} {}", "total", report.total);
            if report.more_may_remain {
                println!("candidate cap reached; more records may remain");
            }
        }
    }
    Ok(())
}

pub(crate) fn render_config(config: &MigrationConfig, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(config)?,
        OutputFormat::Table => {
            let settings = config.driver_settings();
            println!("cloud_name: {}", config.cloudinary.cloud_name);
            println!("upload_url: {}", config.cloudinary.upload_url);
            println!("folder: {}", config.cloudinary.folder);
            println!("store_url: {}", config.store.url);
            println!("table: {}", config.store.table);
            println!(
                "order_by: {}",
                config.store.order_by.as_deref().unwrap_or(DEFAULT_ORDER)
            );
            println!("strategy: {}", settings.strategy.as_str());
            println!("batch_size: {}", settings.batch_size);
            println!("batch_delay_ms: {}", settings.batch_delay.as_millis());
            println!("record_delay_ms: {}", settings.record_delay.as_millis());
            let limit = settings
                .candidate_cap
                .map_or_else(|| "none".to_string(), |cap| cap.to_string());
            println!("limit: {limit}");
            println!("public_id: {}", settings.public_id_for("<id>"));
            println!("dry_run: {}", settings.dry_run);
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct DeliveryView<'a> {
    url: &'a str,
}

pub(crate) fn render_delivery_url(url: &str, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(&DeliveryView { url })?,
        OutputFormat::Table => println!("{url}"),
    }
    Ok(())
}

/// Prints one line per batch and per record to stderr.
pub(crate) struct ConsoleProgress;

impl ProgressSink for ConsoleProgress {
    fn batch_started(&self, index: usize, batch_count: usize, size: usize) {
        eprintln!("batch {}/{batch_count} ({size} records)", index + 1);
    }

    fn record_finished(&self, record_id: &str, name: &str, outcome: &RecordOutcome) {
        eprintln!("  {}", progress_line(record_id, name, outcome));
    }
}

fn progress_line(record_id: &str, name: &str, outcome: &RecordOutcome) -> String {
    match outcome {
        RecordOutcome::Migrated { url: Some(url) } => {
            format!("migrated {record_id} {name} -> {url}")
        }
        RecordOutcome::Migrated { url: None } => format!("would migrate {record_id} {name}"),
        RecordOutcome::Skipped(reason) => {
            format!("skipped  {record_id} {name} ({})", reason.as_str())
        }
        RecordOutcome::Failed { stage, message } => {
            format!("failed   {record_id} {name} [{}] {message}", stage.as_str())
        }
    }
}
