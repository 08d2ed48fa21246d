//! Sequential upload execution with retry, backoff, and continuation policy

use crate::config::{BehaviorConfig, RetryConfig};
use crate::manifest::UploadTask;
use crate::report::{ExecutionReport, ResultStatus, UploadResult};
use crate::transport::{FailureKind, UploadFailure, UploadTransport};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Retry and continuation knobs, resolved from configuration.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts per task, never below 1.
    pub retry_count: u32,
    pub delay_ms: u64,
    pub backoff_multiplier: f64,
    pub skip_missing_files: bool,
    pub continue_on_error: bool,
}

impl RetryPolicy {
    pub fn from_config(retry: &RetryConfig, behavior: &BehaviorConfig) -> Self {
        Self {
            retry_count: retry.count.max(1),
            delay_ms: retry.delay_ms,
            backoff_multiplier: retry.backoff_multiplier,
            skip_missing_files: behavior.skip_missing_files,
            continue_on_error: behavior.continue_on_error,
        }
    }

    /// Delay before the given retry attempt (the second attempt is retry 1).
    fn backoff_delay(&self, retry: u32) -> Duration {
        let factor = self.backoff_multiplier.powi(retry.saturating_sub(1) as i32);
        Duration::from_millis((self.delay_ms as f64 * factor) as u64)
    }
}

/// Whether a failed attempt is worth retrying.
///
/// Server-side and transient conditions retry: 5xx, 429, 408, connection
/// and timeout failures. Other 4xx statuses are definitive and do not.
/// Unclassified failures retry, erring toward another attempt.
fn is_retryable(failure: &UploadFailure) -> bool {
    match failure {
        UploadFailure::Http { status, .. } => {
            *status >= 500 || *status == 429 || *status == 408
        }
        UploadFailure::Connection { .. } => true,
        UploadFailure::Timeout { .. } => true,
        UploadFailure::Unexpected { .. } => true,
    }
}

/// Whether the run proceeds to the next task after this result.
fn should_continue(result: &UploadResult, policy: &RetryPolicy) -> bool {
    match result.status {
        ResultStatus::Success
        | ResultStatus::SkippedMissingFile
        | ResultStatus::SkippedValidationError
        | ResultStatus::SkippedAbort => true,
        ResultStatus::Failed | ResultStatus::Error => policy.continue_on_error,
    }
}

/// Drives the task list through the transport one task at a time.
pub struct UploadExecutor {
    transport: Arc<dyn UploadTransport>,
    policy: RetryPolicy,
    /// Process-level headers applied below manifest and task scopes.
    default_headers: BTreeMap<String, String>,
    shutdown: Option<watch::Receiver<bool>>,
}

impl UploadExecutor {
    pub fn new(transport: Arc<dyn UploadTransport>, policy: RetryPolicy) -> Self {
        Self {
            transport,
            policy,
            default_headers: BTreeMap::new(),
            shutdown: None,
        }
    }

    pub fn with_default_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.default_headers = headers;
        self
    }

    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Executes all tasks in order and finalizes the report.
    ///
    /// A failure with `continue_on_error` disabled aborts the run: every
    /// remaining task is recorded as `SKIPPED_ABORT` and the report is
    /// marked aborted. Otherwise the report is marked completed.
    pub async fn run(&self, tasks: &[UploadTask], report: &mut ExecutionReport) {
        info!(
            tasks = tasks.len(),
            retry_count = self.policy.retry_count,
            continue_on_error = self.policy.continue_on_error,
            "Starting upload execution"
        );

        let mut abort_reason: Option<String> = None;

        for (position, task) in tasks.iter().enumerate() {
            if let Some(reason) = &abort_reason {
                report.add_result(UploadResult::terminal(
                    task,
                    ResultStatus::SkippedAbort,
                    Some(reason.clone()),
                ));
                continue;
            }

            let result = self.execute_task(task).await;
            let proceed = should_continue(&result, &self.policy);

            if !proceed {
                abort_reason = Some(format!(
                    "Aborted after task {} failed: {}",
                    task.index,
                    result.last_error_message.as_deref().unwrap_or("unknown"),
                ));
                warn!(
                    index = task.index,
                    remaining = tasks.len() - position - 1,
                    "Stopping run on failure"
                );
            }

            report.add_result(result);
        }

        match abort_reason {
            Some(reason) => report.mark_aborted(reason),
            None => report.mark_completed(),
        }

        info!(
            succeeded = report.succeeded,
            failed = report.failed,
            skipped = report.skipped,
            errored = report.errored,
            status = report.execution_status.as_str(),
            "Upload execution finished"
        );
    }

    /// Resolves one task to a terminal result: skip, upload with retries,
    /// or fail.
    async fn execute_task(&self, task: &UploadTask) -> UploadResult {
        if !task.file_valid {
            return self.resolve_invalid(task);
        }

        // The file can vanish between validation and execution, and tasks
        // reach this point unvalidated when pre-validation is disabled.
        let exists = task
            .file_path
            .as_deref()
            .is_some_and(|p| std::path::Path::new(p).is_file());
        if !exists {
            let reason = format!(
                "File not found: {}",
                task.file_path.as_deref().unwrap_or("(none)")
            );
            let status = if self.policy.skip_missing_files {
                ResultStatus::SkippedMissingFile
            } else {
                ResultStatus::Failed
            };
            debug!(index = task.index, status = status.as_str(), "File missing at execution time");
            return UploadResult::terminal(task, status, Some(reason));
        }

        self.execute_with_retry(task).await
    }

    /// Maps a task that failed pre-upload validation to its skip or
    /// failure status. `skip_missing_files` governs all validation
    /// rejects, not only missing files.
    fn resolve_invalid(&self, task: &UploadTask) -> UploadResult {
        let reason = task
            .file_validation_error
            .clone()
            .unwrap_or_else(|| "File validation failed".to_string());

        let status = if self.policy.skip_missing_files {
            ResultStatus::SkippedValidationError
        } else {
            ResultStatus::Failed
        };

        debug!(index = task.index, status = status.as_str(), reason = %reason, "Task not uploadable");
        UploadResult::terminal(task, status, Some(reason))
    }

    async fn execute_with_retry(&self, task: &UploadTask) -> UploadResult {
        let headers = self.merged_headers(task);
        let mut result = UploadResult::started(task);

        for attempt in 1..=self.policy.retry_count {
            result.attempt_count = attempt;

            match self.transport.upload(task, &headers).await {
                Ok(success) => {
                    result.status = ResultStatus::Success;
                    result.http_status = Some(success.http_status);
                    result.response_body = success.response_body;
                    result.last_error_message = None;
                    result.failure_kind = None;
                    result.complete();
                    return result;
                }
                Err(failure) => {
                    result.http_status = failure.http_status();
                    result.last_error_message = Some(failure.message().to_string());
                    result.failure_kind = Some(failure.kind());
                    if let UploadFailure::Http {
                        body, api_error, ..
                    } = &failure
                    {
                        result.response_body = body.clone();
                        result.api_error = api_error.clone();
                    }

                    if !is_retryable(&failure) {
                        debug!(
                            index = task.index,
                            attempt,
                            error = failure.message(),
                            "Failure not retryable"
                        );
                        break;
                    }

                    if attempt < self.policy.retry_count {
                        let delay = self.policy.backoff_delay(attempt);
                        debug!(
                            index = task.index,
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            "Retrying after backoff"
                        );
                        if !self.backoff_sleep(delay).await {
                            result.last_error_message =
                                Some("Shutdown requested during retry backoff".to_string());
                            break;
                        }
                    }
                }
            }
        }

        result.status = match result.failure_kind {
            Some(FailureKind::UnexpectedError) => ResultStatus::Error,
            _ => ResultStatus::Failed,
        };
        result.complete();
        result
    }

    /// Sleeps for the backoff delay. Returns false when a shutdown signal
    /// interrupted the wait.
    async fn backoff_sleep(&self, delay: Duration) -> bool {
        match self.shutdown.clone() {
            Some(mut shutdown) => {
                tokio::select! {
                    _ = tokio::time::sleep(delay) => true,
                    _ = shutdown.changed() => {
                        warn!("Shutdown signal received during backoff");
                        false
                    }
                }
            }
            None => {
                tokio::time::sleep(delay).await;
                true
            }
        }
    }

    /// Header precedence: process defaults, then manifest and per-document
    /// overrides already merged onto the task.
    fn merged_headers(&self, task: &UploadTask) -> BTreeMap<String, String> {
        let mut headers = self.default_headers.clone();
        for (name, value) in &task.header_overrides {
            headers.insert(name.clone(), value.clone());
        }
        headers
    }
}
