//! Per-run execution report: per-task results and summary statistics

mod render;

pub use render::{build_csv, build_json, render_summary, write_report, ReportWriteError};

use crate::transport::{ApiErrorResponse, FailureKind};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Outcome status of one upload task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultStatus {
    /// Upload completed successfully (2xx response)
    Success,
    /// Upload failed after all retry attempts
    Failed,
    /// Skipped because the referenced file is missing
    SkippedMissingFile,
    /// Skipped because pre-upload validation marked the task invalid
    SkippedValidationError,
    /// Never attempted: an earlier failure aborted the run
    SkippedAbort,
    /// Unexpected error during processing
    Error,
}

impl ResultStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultStatus::Success => "SUCCESS",
            ResultStatus::Failed => "FAILED",
            ResultStatus::SkippedMissingFile => "SKIPPED_MISSING_FILE",
            ResultStatus::SkippedValidationError => "SKIPPED_VALIDATION_ERROR",
            ResultStatus::SkippedAbort => "SKIPPED_ABORT",
            ResultStatus::Error => "ERROR",
        }
    }
}

/// Result of attempting one upload task.
///
/// Task identity fields are denormalized onto the result so the report can
/// be rendered without holding the task list.
#[derive(Debug, Clone, Serialize)]
pub struct UploadResult {
    pub index: usize,
    pub document_id: String,
    pub file_path: Option<String>,

    pub status: ResultStatus,

    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub duration_ms: u64,

    pub http_status: Option<u16>,
    pub response_body: Option<String>,
    pub api_error: Option<ApiErrorResponse>,

    pub attempt_count: u32,
    pub last_error_message: Option<String>,
    pub failure_kind: Option<FailureKind>,
}

impl UploadResult {
    pub fn started(task: &crate::manifest::UploadTask) -> Self {
        Self {
            index: task.index,
            document_id: task.document_id.clone(),
            file_path: task.file_path.clone(),
            status: ResultStatus::Error,
            started_at: Utc::now(),
            finished_at: None,
            duration_ms: 0,
            http_status: None,
            response_body: None,
            api_error: None,
            attempt_count: 0,
            last_error_message: None,
            failure_kind: None,
        }
    }

    /// Creates a terminal skip/failure result in one step.
    pub fn terminal(
        task: &crate::manifest::UploadTask,
        status: ResultStatus,
        message: Option<String>,
    ) -> Self {
        let mut result = Self::started(task);
        result.status = status;
        result.last_error_message = message;
        result.complete();
        result
    }

    /// Marks this result as finished and records the elapsed duration.
    pub fn complete(&mut self) {
        let finished = Utc::now();
        self.duration_ms = (finished - self.started_at).num_milliseconds().max(0) as u64;
        self.finished_at = Some(finished);
    }

    pub fn is_success(&self) -> bool {
        self.status == ResultStatus::Success
    }

    pub fn is_skipped(&self) -> bool {
        matches!(
            self.status,
            ResultStatus::SkippedMissingFile
                | ResultStatus::SkippedValidationError
                | ResultStatus::SkippedAbort
        )
    }
}

/// Terminal and transitional states of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    Pending,
    Running,
    Completed,
    CompletedWithErrors,
    Aborted,
    Failed,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Pending => "PENDING",
            ExecutionStatus::Running => "RUNNING",
            ExecutionStatus::Completed => "COMPLETED",
            ExecutionStatus::CompletedWithErrors => "COMPLETED_WITH_ERRORS",
            ExecutionStatus::Aborted => "ABORTED",
            ExecutionStatus::Failed => "FAILED",
        }
    }
}

/// Aggregate record of one pipeline run.
///
/// Created and `mark_started` at run entry, mutated by `add_result` once per
/// task, finalized by exactly one of `mark_completed` / `mark_aborted` /
/// `mark_failed`, then handed to the renderer.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionReport {
    pub execution_id: String,
    /// Descriptive label of where the manifest came from (file path, API
    /// request, queue message).
    pub manifest_source: String,

    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub total_duration_ms: u64,

    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub errored: usize,
    pub success_rate: f64,

    pub results: Vec<UploadResult>,
    /// Subsequence of `results` with status FAILED, for quick access.
    pub failures: Vec<UploadResult>,

    pub execution_status: ExecutionStatus,
    pub execution_error_message: Option<String>,
}

impl ExecutionReport {
    pub fn new(execution_id: impl Into<String>, manifest_source: impl Into<String>) -> Self {
        Self {
            execution_id: execution_id.into(),
            manifest_source: manifest_source.into(),
            started_at: None,
            finished_at: None,
            total_duration_ms: 0,
            total: 0,
            succeeded: 0,
            failed: 0,
            skipped: 0,
            errored: 0,
            success_rate: 0.0,
            results: Vec::new(),
            failures: Vec::new(),
            execution_status: ExecutionStatus::Pending,
            execution_error_message: None,
        }
    }

    pub fn mark_started(&mut self) {
        self.started_at = Some(Utc::now());
        self.execution_status = ExecutionStatus::Running;
    }

    /// Adds a result and updates summary statistics.
    pub fn add_result(&mut self, result: UploadResult) {
        match result.status {
            ResultStatus::Success => self.succeeded += 1,
            ResultStatus::Failed => {
                self.failed += 1;
                self.failures.push(result.clone());
            }
            ResultStatus::SkippedMissingFile
            | ResultStatus::SkippedValidationError
            | ResultStatus::SkippedAbort => self.skipped += 1,
            ResultStatus::Error => self.errored += 1,
        }

        self.results.push(result);
        self.total = self.results.len();
        self.update_success_rate();
    }

    pub fn mark_completed(&mut self) {
        self.finish_timing();
        self.execution_status = if self.failed > 0 || self.errored > 0 {
            ExecutionStatus::CompletedWithErrors
        } else {
            ExecutionStatus::Completed
        };
        self.update_success_rate();
    }

    pub fn mark_aborted(&mut self, reason: impl Into<String>) {
        self.finish_timing();
        self.execution_status = ExecutionStatus::Aborted;
        self.execution_error_message = Some(reason.into());
    }

    pub fn mark_failed(&mut self, reason: impl Into<String>) {
        self.finish_timing();
        self.execution_status = ExecutionStatus::Failed;
        self.execution_error_message = Some(reason.into());
    }

    pub fn is_all_success(&self) -> bool {
        self.failed == 0 && self.errored == 0
    }

    fn finish_timing(&mut self) {
        let finished = Utc::now();
        if let Some(started) = self.started_at {
            self.total_duration_ms = (finished - started).num_milliseconds().max(0) as u64;
        }
        self.finished_at = Some(finished);
    }

    fn update_success_rate(&mut self) {
        self.success_rate = if self.total > 0 {
            self.succeeded as f64 / self.total as f64 * 100.0
        } else {
            0.0
        };
    }
}
