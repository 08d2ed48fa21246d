//! API models for the run trigger and status endpoints.
//!
//! Two trigger shapes are accepted:
//! - `POST /api/v1/runs` takes a raw manifest document as the request body
//!   and runs it (or enqueues it when the queue front end is enabled).
//! - `POST /api/v1/runs/manifest` takes an optional `{"path": ...}` body and
//!   runs the manifest file at that path, falling back to the configured
//!   manifest path.

use crate::humanize::format_duration_ms;
use crate::pipeline::RunOutcome;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Body of `POST /api/v1/runs/manifest`.
#[derive(Debug, Default, Deserialize)]
pub struct ManifestRunRequest {
    /// Manifest file path; defaults to the configured `manifest.path`.
    #[serde(default)]
    pub path: Option<String>,
}

/// Synchronous run response.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResponse {
    pub execution_id: String,
    pub execution_status: String,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub errored: usize,
    pub success_rate: String,
    pub duration: String,
    pub report_path: Option<String>,
}

impl From<&RunOutcome> for RunResponse {
    fn from(outcome: &RunOutcome) -> Self {
        let report = &outcome.report;
        Self {
            execution_id: report.execution_id.clone(),
            execution_status: report.execution_status.as_str().to_string(),
            total: report.total,
            succeeded: report.succeeded,
            failed: report.failed,
            skipped: report.skipped,
            errored: report.errored,
            success_rate: format!("{:.2}%", report.success_rate),
            duration: format_duration_ms(report.total_duration_ms),
            report_path: outcome
                .report_path
                .as_ref()
                .map(|p| p.display().to_string()),
        }
    }
}

/// Response when the run was handed to the queue consumer instead of
/// executed inline.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunQueuedResponse {
    pub queued: bool,
    pub source: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub components: HashMap<String, String>,
    pub version: String,
    pub metrics: crate::observability::MetricsSnapshot,
}
