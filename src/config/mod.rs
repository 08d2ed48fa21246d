//! Configuration management for docship
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `DOCSHIP__<section>__<key>`
//!
//! Examples:
//! - `DOCSHIP__SERVER__BIND_ADDR=0.0.0.0:9000`
//! - `DOCSHIP__UPLOAD__ENDPOINT=https://docs.example.com/api/documents`
//! - `DOCSHIP__UPLOAD__MAX_FILE_SIZE=250MB`
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/docship.toml`.
//! This can be overridden using the `DOCSHIP_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use crate::humanize::ByteSize;
pub use models::{
    BehaviorConfig, Config, ManifestConfig, QueueConfig, ReportConfig, ReportFormat, RetryConfig,
    ServerConfig, UploadConfig,
};
pub use validation::ValidationError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file is malformed
    /// - Validation fails (retry budget, endpoint scheme, etc.)
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    ///
    /// Useful for testing with custom configuration files.
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }
}
