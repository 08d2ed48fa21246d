//! Manifest shape detection
//!
//! Shape detection is an explicit tagged enum rather than field-presence
//! checks scattered through extraction logic: each supported shape has a
//! structural predicate, evaluated top-down, and the winner is parsed into
//! its own typed representation before any task is produced.

use super::ManifestError;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// One document entry as it appears in a manifest.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentEntry {
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
    /// Task-local header overrides; win over shared `requestHeaders`.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

/// One application grouping under the multi-application shape.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationEntry {
    #[serde(default)]
    pub application_metadata: Option<Value>,
    #[serde(default)]
    pub documents: Option<Vec<DocumentEntry>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiApplicationManifest {
    /// Shared headers copied onto every task's header map.
    #[serde(default)]
    pub request_headers: BTreeMap<String, String>,
    pub applications: Vec<ApplicationEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleApplicationManifest {
    #[serde(default)]
    pub request_headers: BTreeMap<String, String>,
    #[serde(default)]
    pub application_metadata: Option<Value>,
    pub documents: Vec<DocumentEntry>,
}

/// Detected manifest shape, in detection priority order.
#[derive(Debug, Clone)]
pub enum ManifestShape {
    /// Root is a plain JSON array of document entries.
    DocumentList(Vec<DocumentEntry>),
    /// Container with shared `requestHeaders` and an `applications` array.
    MultiApplication(MultiApplicationManifest),
    /// Exactly one implicit application: `documents` at the top level.
    SingleApplication(SingleApplicationManifest),
}

impl ManifestShape {
    pub fn name(&self) -> &'static str {
        match self {
            ManifestShape::DocumentList(_) => "document-list",
            ManifestShape::MultiApplication(_) => "multi-application",
            ManifestShape::SingleApplication(_) => "single-application",
        }
    }
}

/// Detects and parses the manifest shape.
///
/// Evaluated top-down: array root, then `applications`, then `documents`.
/// A root matching none of the predicates fails the whole call.
pub fn detect_shape(root: &Value) -> Result<ManifestShape, ManifestError> {
    if root.is_array() {
        let entries: Vec<DocumentEntry> = serde_json::from_value(root.clone())
            .map_err(|e| ManifestError::Format(format!("invalid document list: {}", e)))?;
        return Ok(ManifestShape::DocumentList(entries));
    }

    let Some(obj) = root.as_object() else {
        return Err(ManifestError::Format(
            "root must be an array or object".to_string(),
        ));
    };

    if obj.contains_key("applications") {
        let manifest: MultiApplicationManifest = serde_json::from_value(root.clone())
            .map_err(|e| ManifestError::Format(format!("invalid multi-application manifest: {}", e)))?;
        return Ok(ManifestShape::MultiApplication(manifest));
    }

    if obj.contains_key("documents") {
        let manifest: SingleApplicationManifest = serde_json::from_value(root.clone())
            .map_err(|e| {
                ManifestError::Format(format!("invalid single-application manifest: {}", e))
            })?;
        return Ok(ManifestShape::SingleApplication(manifest));
    }

    Err(ManifestError::Format(
        "object has neither 'applications' nor 'documents'".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn detects_document_list() {
        let root = json!([{"filePath": "a.pdf", "metadata": {"k": 1}}]);
        let shape = detect_shape(&root).unwrap();
        assert!(matches!(shape, ManifestShape::DocumentList(ref docs) if docs.len() == 1));
        assert_eq!(shape.name(), "document-list");
    }

    #[test]
    fn detects_multi_application() {
        let root = json!({
            "requestHeaders": {"X-Tenant-Id": "t1"},
            "applications": [
                {"applicationMetadata": {"app": "crm"}, "documents": [{"filePath": "a.pdf"}]}
            ]
        });
        let shape = detect_shape(&root).unwrap();
        match shape {
            ManifestShape::MultiApplication(m) => {
                assert_eq!(m.request_headers.get("X-Tenant-Id").unwrap(), "t1");
                assert_eq!(m.applications.len(), 1);
            }
            other => panic!("unexpected shape: {}", other.name()),
        }
    }

    #[test]
    fn detects_single_application() {
        let root = json!({
            "applicationMetadata": {"app": "billing"},
            "documents": [{"filePath": "a.pdf"}, {"filePath": "b.pdf"}]
        });
        let shape = detect_shape(&root).unwrap();
        match shape {
            ManifestShape::SingleApplication(m) => {
                assert_eq!(m.documents.len(), 2);
                assert!(m.application_metadata.is_some());
            }
            other => panic!("unexpected shape: {}", other.name()),
        }
    }

    #[test]
    fn applications_wins_over_documents() {
        // Both keys present: detection order puts multi-application first.
        let root = json!({
            "applications": [],
            "documents": [{"filePath": "a.pdf"}]
        });
        let shape = detect_shape(&root).unwrap();
        assert!(matches!(shape, ManifestShape::MultiApplication(_)));
    }

    #[test]
    fn rejects_unrecognized_object() {
        let root = json!({"files": [{"path": "a.pdf"}]});
        assert!(matches!(
            detect_shape(&root),
            Err(ManifestError::Format(_))
        ));
    }

    #[test]
    fn rejects_scalar_root() {
        assert!(matches!(
            detect_shape(&json!("not a manifest")),
            Err(ManifestError::Format(_))
        ));
    }

    #[test]
    fn rejects_malformed_applications() {
        let root = json!({"applications": "nope"});
        assert!(matches!(
            detect_shape(&root),
            Err(ManifestError::Format(_))
        ));
    }
}
