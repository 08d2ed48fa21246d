//! Report rendering and persistence
//!
//! A report artifact is written for every run, including runs that failed
//! before any upload was attempted. Filenames carry a timestamp and the
//! execution id so repeated runs never overwrite each other.

use super::{ExecutionReport, UploadResult};
use crate::config::{ReportConfig, ReportFormat};
use crate::humanize::format_duration_ms;
use serde_json::{Value, json};
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ReportWriteError {
    #[error("Failed to create report directory {path}: {source}")]
    CreateDir {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to write report {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Renders the report as a JSON document with metadata, summary, full
/// results, and the failure subset.
pub fn build_json(report: &ExecutionReport) -> Result<String, serde_json::Error> {
    let document: Value = json!({
        "metadata": {
            "executionId": report.execution_id,
            "manifestSource": report.manifest_source,
            "startedAt": report.started_at,
            "finishedAt": report.finished_at,
            "totalDurationMs": report.total_duration_ms,
            "executionStatus": report.execution_status,
            "executionErrorMessage": report.execution_error_message,
        },
        "summary": {
            "total": report.total,
            "succeeded": report.succeeded,
            "failed": report.failed,
            "skipped": report.skipped,
            "errored": report.errored,
            "successRate": format!("{:.2}%", report.success_rate),
        },
        "results": report.results,
        "failures": report.failures,
    });

    serde_json::to_string_pretty(&document)
}

/// Renders the report as CSV, one row per task result.
pub fn build_csv(report: &ExecutionReport) -> String {
    let mut out = String::from(
        "Index,DocumentId,FilePath,Status,HttpStatus,DurationMs,Attempts,ErrorMessage\n",
    );

    for result in &report.results {
        out.push_str(&csv_row(result));
        out.push('\n');
    }

    out
}

fn csv_row(result: &UploadResult) -> String {
    format!(
        "{},{},{},{},{},{},{},{}",
        result.index,
        escape_csv(&result.document_id),
        escape_csv(result.file_path.as_deref().unwrap_or("")),
        result.status.as_str(),
        result
            .http_status
            .map(|s| s.to_string())
            .unwrap_or_default(),
        result.duration_ms,
        result.attempt_count,
        escape_csv(result.last_error_message.as_deref().unwrap_or("")),
    )
}

/// Quotes a CSV field when it contains a separator, quote, or newline.
fn escape_csv(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Renders a human-readable run summary for logs and CLI output.
pub fn render_summary(report: &ExecutionReport) -> String {
    let mut out = format!(
        "Execution {} ({}): {} total, {} succeeded, {} failed, {} skipped, {} errored, \
         success rate {:.2}%, duration {}",
        report.execution_id,
        report.execution_status.as_str(),
        report.total,
        report.succeeded,
        report.failed,
        report.skipped,
        report.errored,
        report.success_rate,
        format_duration_ms(report.total_duration_ms),
    );

    if let Some(message) = &report.execution_error_message {
        out.push_str(&format!("\n  Error: {}", message));
    }

    for failure in &report.failures {
        out.push_str(&format!(
            "\n  [{}] {} ({}): {}",
            failure.index,
            failure.file_path.as_deref().unwrap_or("<no file>"),
            failure.document_id,
            failure.last_error_message.as_deref().unwrap_or("unknown"),
        ));
    }

    out
}

/// Writes the report artifact in the configured format and returns its path.
///
/// The report directory is created if missing. This is the one side effect
/// every run performs regardless of outcome.
pub fn write_report(
    report: &ExecutionReport,
    config: &ReportConfig,
) -> Result<PathBuf, ReportWriteError> {
    std::fs::create_dir_all(&config.dir).map_err(|source| ReportWriteError::CreateDir {
        path: config.dir.display().to_string(),
        source,
    })?;

    let timestamp = chrono::Utc::now().format("%Y%m%d-%H%M%S");
    let file_name = format!(
        "upload-report-{}-{}.{}",
        timestamp,
        report.execution_id,
        config.format.extension()
    );
    let path = config.dir.join(file_name);

    let content = match config.format {
        ReportFormat::Json => build_json(report)?,
        ReportFormat::Csv => build_csv(report),
    };

    std::fs::write(&path, content).map_err(|source| ReportWriteError::Write {
        path: path.display().to_string(),
        source,
    })?;

    info!(path = %path.display(), "Report written");
    Ok(path)
}
