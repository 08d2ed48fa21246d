//! Run orchestration: manifest to tasks to uploads to report
//!
//! One `Pipeline` instance serves every trigger (CLI, API, queue). Each run
//! flows through the same phases: parse, validate, execute, report. A report
//! artifact is written for every run, including runs that die during parsing.

use crate::config::Config;
use crate::executor::{RetryPolicy, UploadExecutor};
use crate::manifest::{self, ManifestError, UploadTask};
use crate::observability::Metrics;
use crate::report::{self, ExecutionReport, ExecutionStatus};
use crate::transport::UploadTransport;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Outcome of one run: the finalized report plus the path of its artifact.
///
/// `report_path` is `None` only when the artifact itself could not be
/// written; that failure is logged and never masks the run outcome.
#[derive(Debug)]
pub struct RunOutcome {
    pub report: ExecutionReport,
    pub report_path: Option<PathBuf>,
}

impl RunOutcome {
    pub fn status(&self) -> ExecutionStatus {
        self.report.execution_status
    }
}

pub struct Pipeline {
    config: Arc<Config>,
    transport: Arc<dyn UploadTransport>,
    metrics: Arc<Metrics>,
    shutdown: Option<watch::Receiver<bool>>,
}

impl Pipeline {
    pub fn new(
        config: Arc<Config>,
        transport: Arc<dyn UploadTransport>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            config,
            transport,
            metrics,
            shutdown: None,
        }
    }

    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Runs the pipeline on a manifest file.
    pub async fn run_from_manifest(&self, path: &Path) -> RunOutcome {
        let source = path.display().to_string();
        let parsed = manifest::normalize_file(path);
        self.run(parsed, source).await
    }

    /// Runs the pipeline on an in-memory manifest payload. `source` labels
    /// the trigger in the report (API request, queue message).
    pub async fn run_from_payload(&self, payload: &Value, source: &str) -> RunOutcome {
        let parsed = manifest::normalize(payload);
        self.run(parsed, source.to_string()).await
    }

    async fn run(
        &self,
        parsed: Result<Vec<UploadTask>, ManifestError>,
        source: String,
    ) -> RunOutcome {
        let execution_id = new_execution_id();
        let mut report = ExecutionReport::new(execution_id.clone(), source.clone());
        report.mark_started();
        self.metrics.run_started();

        info!(execution_id = %execution_id, source = %source, "Pipeline run started");

        match parsed {
            Ok(mut tasks) => {
                if self.config.behavior.pre_validate_manifest {
                    let diagnostics = manifest::validate_tasks(
                        &mut tasks,
                        self.config.upload.max_file_size.as_u64(),
                    );
                    if !diagnostics.is_empty() {
                        warn!(
                            execution_id = %execution_id,
                            issues = diagnostics.len(),
                            "Pre-upload validation found issues"
                        );
                    }
                } else {
                    // Without pre-validation every task goes straight to
                    // the transport.
                    for task in &mut tasks {
                        task.file_valid = true;
                    }
                }

                let policy = RetryPolicy::from_config(&self.config.retry, &self.config.behavior);
                let mut executor = UploadExecutor::new(self.transport.clone(), policy)
                    .with_default_headers(self.config.upload.default_headers.clone());
                if let Some(shutdown) = &self.shutdown {
                    executor = executor.with_shutdown(shutdown.clone());
                }

                executor.run(&tasks, &mut report).await;
                self.metrics
                    .uploads_finished(report.succeeded as u64, (report.failed + report.errored) as u64);
            }
            Err(e) => {
                error!(execution_id = %execution_id, error = %e, "Manifest could not be processed");
                report.mark_failed(e.to_string());
                self.metrics.run_failed();
            }
        }

        let report_path = match report::write_report(&report, &self.config.report) {
            Ok(path) => {
                self.metrics.report_written();
                Some(path)
            }
            Err(e) => {
                error!(execution_id = %execution_id, error = %e, "Failed to write report artifact");
                None
            }
        };

        info!(
            execution_id = %execution_id,
            status = report.execution_status.as_str(),
            "{}",
            report::render_summary(&report)
        );

        RunOutcome {
            report,
            report_path,
        }
    }
}

/// Short, log-friendly run identifier.
fn new_execution_id() -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    format!("exec-{}", &uuid[..8])
}
