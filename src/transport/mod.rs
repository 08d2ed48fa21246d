//! Upload transport: one attempt against the remote document API
//!
//! The executor drives retries and continuation policy; the transport's only
//! job is to perform a single upload attempt and classify its outcome. The
//! core never inspects transport internals beyond this contract.

mod http;

pub use http::HttpUploadClient;

use crate::manifest::UploadTask;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Classification of a failed attempt, used by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    HttpError,
    ConnectionError,
    TimeoutError,
    UnexpectedError,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FailureKind::HttpError => "http-error",
            FailureKind::ConnectionError => "connection-error",
            FailureKind::TimeoutError => "timeout-error",
            FailureKind::UnexpectedError => "unexpected-error",
        };
        f.write_str(s)
    }
}

/// Successful attempt: 2xx status plus the raw response body.
#[derive(Debug, Clone)]
pub struct AttemptSuccess {
    pub http_status: u16,
    pub response_body: Option<String>,
}

/// Failed attempt with enough detail for retry classification and reporting.
#[derive(Debug, Clone)]
pub enum UploadFailure {
    /// The server answered with a non-2xx status.
    Http {
        status: u16,
        body: Option<String>,
        api_error: Option<ApiErrorResponse>,
        message: String,
    },
    /// The request never completed: connection-level failure.
    Connection { message: String },
    /// The request never completed: connect/read timeout.
    Timeout { message: String },
    /// Anything else (local file read, serialization, ...).
    Unexpected { message: String },
}

impl UploadFailure {
    pub fn kind(&self) -> FailureKind {
        match self {
            UploadFailure::Http { .. } => FailureKind::HttpError,
            UploadFailure::Connection { .. } => FailureKind::ConnectionError,
            UploadFailure::Timeout { .. } => FailureKind::TimeoutError,
            UploadFailure::Unexpected { .. } => FailureKind::UnexpectedError,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            UploadFailure::Http { message, .. } => message,
            UploadFailure::Connection { message } => message,
            UploadFailure::Timeout { message } => message,
            UploadFailure::Unexpected { message } => message,
        }
    }

    pub fn http_status(&self) -> Option<u16> {
        match self {
            UploadFailure::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Performs a single upload attempt for one task.
///
/// `headers` is the fully merged header map (process defaults overlaid with
/// the task's overrides); implementations apply it verbatim.
#[async_trait]
pub trait UploadTransport: Send + Sync {
    async fn upload(
        &self,
        task: &UploadTask,
        headers: &BTreeMap<String, String>,
    ) -> Result<AttemptSuccess, UploadFailure>;
}

/// Error body in RFC 7807 problem-detail form, with a few common
/// alternative field names tolerated. All fields optional: parsing is
/// best-effort and unknown fields are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiErrorResponse {
    #[serde(rename = "type")]
    pub problem_type: Option<String>,
    pub title: Option<String>,
    pub status: Option<u16>,
    pub detail: Option<String>,
    pub instance: Option<String>,
    #[serde(rename = "errorCode")]
    pub error_code: Option<String>,
    #[serde(rename = "traceId")]
    pub trace_id: Option<String>,
    // Alternative field names used by other APIs
    pub message: Option<String>,
    pub error: Option<String>,
}

impl ApiErrorResponse {
    /// Picks the most specific human-readable message from the available
    /// fields, in problem-detail preference order.
    pub fn effective_message(&self) -> &str {
        for candidate in [&self.detail, &self.message, &self.title, &self.error] {
            if let Some(value) = candidate {
                if !value.trim().is_empty() {
                    return value;
                }
            }
        }
        "Unknown error"
    }

    /// Best-effort parse of an error response body. Returns `None` when the
    /// body is empty or not JSON in any recognized form.
    pub fn parse(body: &str) -> Option<Self> {
        if body.trim().is_empty() {
            return None;
        }
        serde_json::from_str(body).ok()
    }
}
