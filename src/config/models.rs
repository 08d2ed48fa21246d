use crate::humanize::ByteSize;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Top-level configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub manifest: ManifestConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub behavior: BehaviorConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub queue: QueueConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: ByteSize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            max_payload_bytes: default_max_payload_bytes(),
        }
    }
}

/// Manifest source configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ManifestConfig {
    /// Path to the manifest file used by the `run` command and the
    /// manifest-triggered API endpoint. Optional: direct-JSON runs do not
    /// need it.
    pub path: Option<PathBuf>,
}

/// Upload API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadConfig {
    /// Target endpoint URL for the document upload API
    #[serde(default)]
    pub endpoint: String,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    /// Maximum size of a single uploadable file
    #[serde(default = "default_max_file_size")]
    pub max_file_size: ByteSize,
    /// Process-wide headers applied to every request unless a task carries
    /// its own value for the same header name
    #[serde(default)]
    pub default_headers: BTreeMap<String, String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            connect_timeout_ms: default_connect_timeout_ms(),
            read_timeout_ms: default_read_timeout_ms(),
            max_file_size: default_max_file_size(),
            default_headers: BTreeMap::new(),
        }
    }
}

/// Retry and backoff configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    /// Total attempt budget per task, including the first attempt (min 1)
    #[serde(default = "default_retry_count")]
    pub count: u32,
    /// Initial delay between attempts in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub delay_ms: u64,
    /// Exponential backoff multiplier applied after each retryable attempt
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            count: default_retry_count(),
            delay_ms: default_retry_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

/// Behavior flags governing executor decisions
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BehaviorConfig {
    /// Record invalid-file tasks as skipped instead of failed
    #[serde(default = "default_true")]
    pub skip_missing_files: bool,
    /// Keep processing remaining tasks after a failed upload
    #[serde(default = "default_true")]
    pub continue_on_error: bool,
    /// Log validation diagnostics before the upload phase starts
    #[serde(default = "default_true")]
    pub pre_validate_manifest: bool,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            skip_missing_files: true,
            continue_on_error: true,
            pre_validate_manifest: true,
        }
    }
}

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Json,
    Csv,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Json => "json",
            ReportFormat::Csv => "csv",
        }
    }
}

/// Report output configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReportConfig {
    #[serde(default = "default_report_dir")]
    pub dir: PathBuf,
    #[serde(default)]
    pub format: ReportFormat,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            dir: default_report_dir(),
            format: ReportFormat::Json,
        }
    }
}

/// Asynchronous queue front-end configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueueConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Bounded channel capacity for queued run payloads (backpressure)
    #[serde(default = "default_queue_channel_size")]
    pub channel_size: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            channel_size: default_queue_channel_size(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    "0.0.0.0:8080".parse().unwrap()
}

fn default_max_payload_bytes() -> ByteSize {
    ByteSize(5 * 1024 * 1024) // 5 MB
}

fn default_connect_timeout_ms() -> u64 {
    30_000
}

fn default_read_timeout_ms() -> u64 {
    60_000
}

fn default_max_file_size() -> ByteSize {
    ByteSize(100 * 1024 * 1024) // 100 MB
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_report_dir() -> PathBuf {
    PathBuf::from("data/reports")
}

fn default_queue_channel_size() -> usize {
    100
}

fn default_true() -> bool {
    true
}
