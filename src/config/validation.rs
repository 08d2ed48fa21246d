use super::models::Config;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("retry.count must be at least 1 (got {0})")]
    RetryCountTooLow(u32),

    #[error("retry.backoff_multiplier must be at least 1.0 (got {0})")]
    BackoffMultiplierTooLow(f64),

    #[error("upload.endpoint must be an http/https URL: {0}")]
    InvalidEndpoint(String),

    #[error("report.dir must not be empty")]
    EmptyReportDir,

    #[error("queue.channel_size must be at least 1")]
    InvalidQueueChannelSize,
}

/// Validates cross-field constraints after loading.
///
/// An empty upload endpoint passes: manifests can be normalized and
/// validated without one, and the pipeline fails the run with a clear
/// transport error if an upload is actually attempted.
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    if config.retry.count < 1 {
        return Err(ValidationError::RetryCountTooLow(config.retry.count));
    }

    if config.retry.backoff_multiplier < 1.0 {
        return Err(ValidationError::BackoffMultiplierTooLow(
            config.retry.backoff_multiplier,
        ));
    }

    if !config.upload.endpoint.is_empty()
        && !config.upload.endpoint.starts_with("http://")
        && !config.upload.endpoint.starts_with("https://")
    {
        return Err(ValidationError::InvalidEndpoint(
            config.upload.endpoint.clone(),
        ));
    }

    if config.report.dir.as_os_str().is_empty() {
        return Err(ValidationError::EmptyReportDir);
    }

    if config.queue.enabled && config.queue.channel_size == 0 {
        return Err(ValidationError::InvalidQueueChannelSize);
    }

    Ok(())
}
