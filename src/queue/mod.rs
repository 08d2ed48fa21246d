//! Asynchronous queue front end
//!
//! A bounded in-process channel feeding the pipeline. Producers (the API,
//! tests, embedding code) enqueue manifest payloads; a single consumer task
//! drains them sequentially. A message that fails is logged and consumed,
//! never redelivered.

use crate::config::QueueConfig;
use crate::pipeline::Pipeline;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// One enqueued manifest run request.
#[derive(Debug, Clone)]
pub struct QueueMessage {
    pub payload: Value,
    /// Label recorded as the run's manifest source.
    pub source: String,
}

impl QueueMessage {
    pub fn new(payload: Value, source: impl Into<String>) -> Self {
        Self {
            payload,
            source: source.into(),
        }
    }
}

/// Producer handle for the queue front end.
#[derive(Clone)]
pub struct QueueSender {
    tx: mpsc::Sender<QueueMessage>,
}

#[derive(Debug, thiserror::Error)]
pub enum EnqueueError {
    #[error("Queue is full")]
    Full,
    #[error("Queue consumer has stopped")]
    Closed,
}

impl QueueSender {
    /// Non-blocking enqueue. Backpressure surfaces as `Full` so the caller
    /// can report it instead of stalling.
    pub fn enqueue(&self, message: QueueMessage) -> Result<(), EnqueueError> {
        self.tx.try_send(message).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => EnqueueError::Full,
            mpsc::error::TrySendError::Closed(_) => EnqueueError::Closed,
        })
    }
}

/// Spawns the consumer task and returns the producer handle.
///
/// The consumer stops when every `QueueSender` is dropped and the channel
/// drains.
pub fn spawn_consumer(
    pipeline: Arc<Pipeline>,
    config: &QueueConfig,
) -> (QueueSender, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<QueueMessage>(config.channel_size.max(1));

    let handle = tokio::spawn(async move {
        info!("Queue consumer started");

        while let Some(message) = rx.recv().await {
            let source = message.source.clone();
            let outcome = pipeline
                .run_from_payload(&message.payload, &source)
                .await;

            if outcome.report.is_all_success() {
                info!(
                    source = %source,
                    execution_id = %outcome.report.execution_id,
                    "Queued run finished"
                );
            } else {
                warn!(
                    source = %source,
                    execution_id = %outcome.report.execution_id,
                    status = outcome.status().as_str(),
                    failed = outcome.report.failed,
                    errored = outcome.report.errored,
                    "Queued run finished with errors"
                );
            }

            if outcome.report_path.is_none() {
                error!(source = %source, "Queued run produced no report artifact");
            }
        }

        info!("Queue consumer stopped");
    });

    (QueueSender { tx }, handle)
}
