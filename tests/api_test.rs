use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use async_trait::async_trait;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;
use tower::ServiceExt; // for `oneshot`

use docship::api;
use docship::api::state::AppState;
use docship::config::Config;
use docship::manifest::UploadTask;
use docship::observability::Metrics;
use docship::pipeline::Pipeline;
use docship::transport::{AttemptSuccess, UploadFailure, UploadTransport};

/// Transport stub that always succeeds, counting calls.
struct OkTransport {
    calls: AtomicUsize,
}

#[async_trait]
impl UploadTransport for OkTransport {
    async fn upload(
        &self,
        _task: &UploadTask,
        _headers: &BTreeMap<String, String>,
    ) -> Result<AttemptSuccess, UploadFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(AttemptSuccess {
            http_status: 201,
            response_body: Some("{\"id\":\"srv\"}".to_string()),
        })
    }
}

/// Test config with an isolated report directory, parsed from TOML the way
/// a deployment would provide it.
fn test_config(report_dir: &std::path::Path) -> Config {
    let config_toml = format!(
        r#"
[server]
bind_addr = "127.0.0.1:8080"
max_payload_bytes = "1KB"

[upload]
endpoint = "https://upload.example.com/api/documents"

[retry]
count = 1

[report]
dir = "{}"
"#,
        report_dir.display()
    );

    toml::from_str(&config_toml).expect("Failed to parse test config")
}

fn build_test_app_with(config: Config) -> (Router, Arc<OkTransport>) {
    let transport = Arc::new(OkTransport {
        calls: AtomicUsize::new(0),
    });
    let metrics = Arc::new(Metrics::default());

    let config = Arc::new(config);
    let pipeline = Arc::new(Pipeline::new(
        config.clone(),
        transport.clone(),
        metrics.clone(),
    ));

    let queue_sender = if config.queue.enabled {
        let (sender, _consumer) = docship::queue::spawn_consumer(pipeline.clone(), &config.queue);
        Some(sender)
    } else {
        None
    };

    let state = AppState::new(config, pipeline, metrics, queue_sender);
    (api::router(state), transport)
}

/// Builds an app plus a temp dir holding two uploadable files and the
/// report output directory.
fn build_test_app() -> (Router, Arc<OkTransport>, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    std::fs::write(temp_dir.path().join("a.pdf"), b"file a").unwrap();
    std::fs::write(temp_dir.path().join("b.pdf"), b"file b").unwrap();

    let report_dir = temp_dir.path().join("reports");
    let (app, transport) = build_test_app_with(test_config(&report_dir));
    (app, transport, temp_dir)
}

fn document_list_manifest(dir: &std::path::Path) -> serde_json::Value {
    json!([
        {"filePath": dir.join("a.pdf").to_str().unwrap(), "metadata": {"title": "A"}},
        {"filePath": dir.join("b.pdf").to_str().unwrap()}
    ])
}

fn post_run_request(payload: serde_json::Value) -> Request<Body> {
    Request::builder()
        .uri("/api/v1/runs")
        .method("POST")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(&payload).unwrap()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn run_payload_executes_and_reports() {
    let (app, transport, temp_dir) = build_test_app();

    let request = post_run_request(document_list_manifest(temp_dir.path()));
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["executionStatus"], "COMPLETED");
    assert_eq!(body["total"], 2);
    assert_eq!(body["succeeded"], 2);
    assert_eq!(body["successRate"], "100.00%");
    assert!(body["executionId"].as_str().unwrap().starts_with("exec-"));

    assert_eq!(transport.calls.load(Ordering::SeqCst), 2);

    // The run also persisted its report artifact.
    let report_path = body["reportPath"].as_str().unwrap();
    assert!(std::path::Path::new(report_path).exists());
}

#[tokio::test]
async fn run_payload_rejects_wrong_content_type() {
    let (app, _, temp_dir) = build_test_app();

    let request = Request::builder()
        .uri("/api/v1/runs")
        .method("POST")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from(
            serde_json::to_string(&document_list_manifest(temp_dir.path())).unwrap(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn run_payload_rejects_missing_content_type() {
    let (app, _, _temp_dir) = build_test_app();

    let request = Request::builder()
        .uri("/api/v1/runs")
        .method("POST")
        .body(Body::from("[]"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn run_payload_rejects_invalid_json() {
    let (app, _, _temp_dir) = build_test_app();

    let request = Request::builder()
        .uri("/api/v1/runs")
        .method("POST")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["code"], "INVALID_PAYLOAD");
}

#[tokio::test]
async fn run_payload_enforces_size_limit() {
    let (app, _, _temp_dir) = build_test_app();

    // Config caps payloads at 1KB.
    let big = json!([{"filePath": "x".repeat(4096)}]);
    let response = app.oneshot(post_run_request(big)).await.unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn unrecognized_manifest_reports_failed_run() {
    let (app, transport, _temp_dir) = build_test_app();

    let response = app
        .oneshot(post_run_request(json!({"batches": []})))
        .await
        .unwrap();

    // The trigger itself succeeds; the run outcome carries the failure.
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["executionStatus"], "FAILED");
    assert_eq!(body["total"], 0);
    assert_eq!(transport.calls.load(Ordering::SeqCst), 0);

    // Even a failed run writes its report artifact.
    let report_path = body["reportPath"].as_str().unwrap();
    assert!(std::path::Path::new(report_path).exists());
}

#[tokio::test]
async fn run_manifest_endpoint_uses_request_path() {
    let (app, _, temp_dir) = build_test_app();

    let manifest_path = temp_dir.path().join("manifest.json");
    std::fs::write(
        &manifest_path,
        serde_json::to_vec(&document_list_manifest(temp_dir.path())).unwrap(),
    )
    .unwrap();

    let request = Request::builder()
        .uri("/api/v1/runs/manifest")
        .method("POST")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::to_string(&json!({"path": manifest_path.to_str().unwrap()})).unwrap(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["executionStatus"], "COMPLETED");
    assert_eq!(body["total"], 2);
}

#[tokio::test]
async fn run_manifest_endpoint_requires_a_path() {
    let (app, _, _temp_dir) = build_test_app();

    let request = Request::builder()
        .uri("/api/v1/runs/manifest")
        .method("POST")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["code"], "MANIFEST_NOT_CONFIGURED");
}

#[tokio::test]
async fn queue_enabled_accepts_and_defers() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("a.pdf"), b"file a").unwrap();

    let mut config = test_config(&temp_dir.path().join("reports"));
    config.queue.enabled = true;
    let (app, _transport) = build_test_app_with(config);

    let payload = json!([
        {"filePath": temp_dir.path().join("a.pdf").to_str().unwrap()}
    ]);
    let response = app.oneshot(post_run_request(payload)).await.unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = body_json(response).await;
    assert_eq!(body["queued"], true);
    assert!(body["source"].as_str().unwrap().starts_with("api:queued:"));
}

#[tokio::test]
async fn health_reports_components_and_metrics() {
    let (app, _, _temp_dir) = build_test_app();

    let request = Request::builder()
        .uri("/health")
        .method("GET")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["components"]["queue"], "disabled");
    assert_eq!(body["metrics"]["runs_started"], 0);
}

#[tokio::test]
async fn config_endpoint_masks_default_headers() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = test_config(&temp_dir.path().join("reports"));
    config
        .upload
        .default_headers
        .insert("Cookie".to_string(), "session=secret".to_string());
    let (app, _) = build_test_app_with(config);

    let request = Request::builder()
        .uri("/api/v1/config")
        .method("GET")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["upload"]["default_headers"]["Cookie"], "***");
    assert_eq!(
        body["upload"]["endpoint"],
        "https://upload.example.com/api/documents"
    );
}
