//! Manifest ingestion: shape detection, normalization, task validation
//!
//! A manifest describes one or more documents to upload. Several JSON shapes
//! are accepted; all of them normalize into the same flat, ordered list of
//! [`UploadTask`] values consumed by the executor.

mod normalize;
mod shape;
mod task;
pub mod validation;

pub use normalize::{normalize, normalize_file};
pub use shape::{ApplicationEntry, DocumentEntry, ManifestShape, detect_shape};
pub use task::UploadTask;
pub use validation::validate_tasks;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    /// The payload matches no supported manifest shape. Fatal to the run:
    /// no partial task list is produced.
    #[error("Unsupported manifest shape: {0}")]
    Format(String),

    #[error("Failed to read manifest {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Manifest {path} is not valid JSON: {source}")]
    Syntax {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
