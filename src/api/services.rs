use axum::{Json, extract::State, http::HeaderMap, response::IntoResponse};
use http_body_util::BodyExt;
use serde_json::Value;
use tracing::info;

use super::{
    models::{HealthResponse, ManifestRunRequest, RunQueuedResponse, RunResponse},
    state::AppState,
};
use crate::api::error::ApiError;
use crate::queue::QueueMessage;

/// Direct run endpoint (POST /api/v1/runs)
///
/// The request body is the manifest document itself. With the queue front
/// end enabled the manifest is enqueued and 202 returned; otherwise the run
/// executes inline and the response carries the finished run's summary.
pub async fn run_payload(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: axum::body::Body,
) -> Result<impl IntoResponse, ApiError> {
    let content_type = headers
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    super::utils::require_json_content_type(content_type)?;

    let body_bytes = read_body(&state, body).await?;
    let payload: Value = serde_json::from_slice(&body_bytes)?;

    if let Some(queue) = &state.queue {
        let source = format!("api:queued:{}", uuid::Uuid::new_v4().simple());
        queue
            .enqueue(QueueMessage::new(payload, source.clone()))
            .map_err(|e| ApiError::QueueUnavailable(e.to_string()))?;

        info!(source = %source, "Manifest enqueued");
        return Ok((
            axum::http::StatusCode::ACCEPTED,
            Json(serde_json::json!(RunQueuedResponse {
                queued: true,
                source,
            })),
        ));
    }

    let outcome = state.pipeline.run_from_payload(&payload, "api:request").await;

    Ok((
        axum::http::StatusCode::OK,
        Json(serde_json::json!(RunResponse::from(&outcome))),
    ))
}

/// Manifest-file run endpoint (POST /api/v1/runs/manifest)
///
/// Runs the manifest file named in the optional `{"path": ...}` body, or
/// the configured `manifest.path` when the body names none. Always runs
/// inline; file-based runs are operator-triggered and want the result.
pub async fn run_manifest(
    State(state): State<AppState>,
    body: axum::body::Body,
) -> Result<impl IntoResponse, ApiError> {
    let body_bytes = read_body(&state, body).await?;

    let request: ManifestRunRequest = if body_bytes.is_empty() {
        ManifestRunRequest::default()
    } else {
        serde_json::from_slice(&body_bytes)?
    };

    let path = request
        .path
        .map(std::path::PathBuf::from)
        .or_else(|| state.config.manifest.path.clone())
        .ok_or(ApiError::ManifestNotConfigured)?;

    info!(path = %path.display(), "Manifest run triggered via API");
    let outcome = state.pipeline.run_from_manifest(&path).await;

    Ok((
        axum::http::StatusCode::OK,
        Json(serde_json::json!(RunResponse::from(&outcome))),
    ))
}

/// Effective configuration endpoint (GET /api/v1/config)
///
/// Header values configured as process defaults may carry credentials, so
/// they are masked before serialization.
pub async fn get_config(State(state): State<AppState>) -> impl IntoResponse {
    let mut config = (*state.config).clone();
    for value in config.upload.default_headers.values_mut() {
        *value = "***".to_string();
    }

    (axum::http::StatusCode::OK, Json(config))
}

/// Health check endpoint (GET /health)
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    use std::collections::HashMap;

    let mut components = HashMap::new();
    components.insert("api".to_string(), "healthy".to_string());
    components.insert("pipeline".to_string(), "healthy".to_string());
    components.insert(
        "queue".to_string(),
        if state.queue.is_some() {
            "enabled".to_string()
        } else {
            "disabled".to_string()
        },
    );

    let response = HealthResponse {
        status: "healthy".to_string(),
        components,
        version: env!("CARGO_PKG_VERSION").to_string(),
        metrics: state.metrics.snapshot(),
    };

    (axum::http::StatusCode::OK, Json(response))
}

/// Reads the request body. Decompression is handled upstream by the
/// RequestDecompressionLayer middleware.
async fn read_body(state: &AppState, body: axum::body::Body) -> Result<Vec<u8>, ApiError> {
    let data = body
        .collect()
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?
        .to_bytes()
        .to_vec();

    super::utils::validate_body_size(&data, state.config.server.max_payload_bytes.as_u64() as usize)?;

    Ok(data)
}
