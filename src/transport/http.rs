//! Reqwest-backed upload transport
//!
//! Builds a multipart/form-data request per RFC 7578 with two parts:
//! `document` (the file content) and `metadata` (the task's JSON metadata,
//! forwarded verbatim). Connect/read timeouts are enforced here; the retry
//! policy upstream reacts to the failure classification.

use super::{ApiErrorResponse, AttemptSuccess, UploadFailure, UploadTransport};
use crate::config::UploadConfig;
use crate::manifest::UploadTask;
use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ClientBuildError {
    #[error("Failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}

pub struct HttpUploadClient {
    client: Client,
    endpoint: String,
}

impl HttpUploadClient {
    pub fn new(config: &UploadConfig) -> Result<Self, ClientBuildError> {
        debug!(
            endpoint = %config.endpoint,
            connect_timeout_ms = config.connect_timeout_ms,
            read_timeout_ms = config.read_timeout_ms,
            "Initializing upload client"
        );

        let client = Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .timeout(Duration::from_millis(config.read_timeout_ms))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    async fn build_form(&self, task: &UploadTask) -> Result<Form, UploadFailure> {
        let path = task.file_path.as_deref().ok_or(UploadFailure::Unexpected {
            message: "No file path resolved for task".to_string(),
        })?;

        // Validation passed earlier, but the file can still disappear or
        // turn unreadable between phases.
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| UploadFailure::Unexpected {
                message: format!("Failed to read {}: {}", path, e),
            })?;

        let file_name = std::path::Path::new(path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());

        debug!(file = %file_name, size = bytes.len(), "Added document part");

        let document_part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/octet-stream")
            .map_err(|e| UploadFailure::Unexpected {
                message: format!("Invalid document part: {}", e),
            })?;

        let metadata_json = task.metadata.to_string();
        let metadata_part = Part::text(metadata_json)
            .mime_str("application/json")
            .map_err(|e| UploadFailure::Unexpected {
                message: format!("Invalid metadata part: {}", e),
            })?;

        Ok(Form::new()
            .part("document", document_part)
            .part("metadata", metadata_part))
    }

    fn classify_request_error(e: reqwest::Error) -> UploadFailure {
        if e.is_timeout() {
            UploadFailure::Timeout {
                message: format!("Request timed out: {}", e),
            }
        } else if e.is_connect() {
            UploadFailure::Connection {
                message: format!("Connection error: {}", e),
            }
        } else if e.is_request() || e.is_body() {
            UploadFailure::Connection {
                message: format!("Request failed: {}", e),
            }
        } else {
            UploadFailure::Unexpected {
                message: format!("Unexpected error: {}", e),
            }
        }
    }
}

#[async_trait]
impl UploadTransport for HttpUploadClient {
    async fn upload(
        &self,
        task: &UploadTask,
        headers: &BTreeMap<String, String>,
    ) -> Result<AttemptSuccess, UploadFailure> {
        debug!(index = task.index, file = ?task.file_path, "Starting upload attempt");

        let form = self.build_form(task).await?;

        let mut request = self.client.post(&self.endpoint).multipart(form);
        for (name, value) in headers {
            request = request.header(name, value);
        }

        let response = request
            .send()
            .await
            .map_err(Self::classify_request_error)?;

        let status = response.status();
        let body = response.text().await.ok();

        if status.is_success() {
            debug!(index = task.index, status = status.as_u16(), "Upload attempt succeeded");
            return Ok(AttemptSuccess {
                http_status: status.as_u16(),
                response_body: body,
            });
        }

        // Best-effort decode of a problem-detail-shaped error body.
        let api_error = body.as_deref().and_then(ApiErrorResponse::parse);
        let reason = api_error
            .as_ref()
            .map(|e| e.effective_message().to_string())
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Unknown")
                    .to_string()
            });

        warn!(
            index = task.index,
            status = status.as_u16(),
            error = %reason,
            "Upload attempt failed"
        );

        Err(UploadFailure::Http {
            status: status.as_u16(),
            body,
            api_error,
            message: format!("HTTP {}: {}", status.as_u16(), reason),
        })
    }
}
