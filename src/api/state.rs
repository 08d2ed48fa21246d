use std::sync::Arc;

use crate::config::Config;
use crate::observability::Metrics;
use crate::pipeline::Pipeline;
use crate::queue::QueueSender;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pipeline: Arc<Pipeline>,
    pub metrics: Arc<Metrics>,
    /// Present only when the queue front end is enabled.
    pub queue: Option<QueueSender>,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        pipeline: Arc<Pipeline>,
        metrics: Arc<Metrics>,
        queue: Option<QueueSender>,
    ) -> Self {
        Self {
            config,
            pipeline,
            metrics,
            queue,
        }
    }
}
