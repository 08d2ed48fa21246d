use std::sync::Arc;

use axum::{Router, routing::get, routing::post};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::decompression::RequestDecompressionLayer;
use tracing::info;

use super::{
    services::{get_config, health, run_manifest, run_payload},
    state::AppState,
};
use crate::config::Config;
use crate::observability::Metrics;
use crate::pipeline::Pipeline;
use crate::queue;
use crate::transport::HttpUploadClient;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Builds the application router. Extracted from `run` so tests can drive
/// it without binding a socket.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/runs", post(run_payload))
        .route("/api/v1/runs/manifest", post(run_manifest))
        .route("/api/v1/config", get(get_config))
        .route("/health", get(health))
        .with_state(state)
        // Transparent gzip/deflate/brotli request body decompression
        .layer(RequestDecompressionLayer::new())
}

pub async fn run(config: Config) -> Result<(), AnyError> {
    let config = Arc::new(config);
    let metrics = Arc::new(Metrics::default());

    let transport = Arc::new(
        HttpUploadClient::new(&config.upload)
            .map_err(|e| format!("Failed to build upload client: {}", e))?,
    );

    // Shutdown propagates to in-flight retry backoff waits.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let pipeline = Arc::new(
        Pipeline::new(config.clone(), transport, metrics.clone())
            .with_shutdown(shutdown_rx),
    );

    let queue_sender = if config.queue.enabled {
        let (sender, _consumer) = queue::spawn_consumer(pipeline.clone(), &config.queue);
        info!(channel_size = config.queue.channel_size, "Queue front end enabled");
        Some(sender)
    } else {
        None
    };

    let state = AppState::new(config.clone(), pipeline, metrics, queue_sender);
    let app = router(state);

    let listener = TcpListener::bind(config.server.bind_addr).await?;
    info!(address = %config.server.bind_addr, "docship API listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = shutdown_tx.send(true);
        })
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm = signal(SignalKind::terminate())
            .expect("failed to install signal handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
