use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// One document's upload unit, derived from a manifest entry.
///
/// Created by the normalizer, annotated exactly once by
/// [`validate_tasks`](super::validate_tasks) (validity fields only) and
/// immutable afterwards. Lives for the duration of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct UploadTask {
    /// Zero-based position across the full flattened task sequence
    /// (applications in listed order, documents in listed order within each).
    pub index: usize,

    /// Correlation identifier, freshly generated per run.
    pub document_id: String,

    /// Source location of the file content, resolved lazily at upload time.
    pub file_path: Option<String>,

    /// Opaque metadata forwarded verbatim to the remote API.
    pub metadata: Value,

    /// Metadata of the parent application grouping, when the manifest
    /// carries one.
    pub application_metadata: Option<Value>,

    /// Per-task header overrides. Task values win over process-wide
    /// defaults at request-build time.
    pub header_overrides: BTreeMap<String, String>,

    /// Set by the validator; `false` means the task cannot be uploaded.
    pub file_valid: bool,
    pub file_validation_error: Option<String>,
}

impl UploadTask {
    pub fn new(index: usize, document_id: String) -> Self {
        Self {
            index,
            document_id,
            file_path: None,
            metadata: Value::Object(serde_json::Map::new()),
            application_metadata: None,
            header_overrides: BTreeMap::new(),
            file_valid: false,
            file_validation_error: None,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.header_overrides.get(name).map(String::as_str)
    }
}

impl std::fmt::Display for UploadTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "UploadTask[index={}, id={}, file={}, valid={}]",
            self.index,
            self.document_id,
            self.file_path.as_deref().unwrap_or("(none)"),
            self.file_valid
        )
    }
}
