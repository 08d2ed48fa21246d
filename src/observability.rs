//! Process-wide counters exposed through the API and logs

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Cheap atomic counters for run and upload activity. Shared across the
/// pipeline, API, and queue consumer behind an `Arc`.
#[derive(Debug, Default)]
pub struct Metrics {
    runs_started: AtomicU64,
    runs_failed: AtomicU64,
    uploads_succeeded: AtomicU64,
    uploads_failed: AtomicU64,
    reports_written: AtomicU64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub runs_started: u64,
    pub runs_failed: u64,
    pub uploads_succeeded: u64,
    pub uploads_failed: u64,
    pub reports_written: u64,
}

impl Metrics {
    pub fn run_started(&self) {
        self.runs_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn run_failed(&self) {
        self.runs_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uploads_finished(&self, succeeded: u64, failed: u64) {
        self.uploads_succeeded.fetch_add(succeeded, Ordering::Relaxed);
        self.uploads_failed.fetch_add(failed, Ordering::Relaxed);
    }

    pub fn report_written(&self) {
        self.reports_written.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            runs_started: self.runs_started.load(Ordering::Relaxed),
            runs_failed: self.runs_failed.load(Ordering::Relaxed),
            uploads_succeeded: self.uploads_succeeded.load(Ordering::Relaxed),
            uploads_failed: self.uploads_failed.load(Ordering::Relaxed),
            reports_written: self.reports_written.load(Ordering::Relaxed),
        }
    }
}
