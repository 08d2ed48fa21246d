//! Normalization of detected manifest shapes into a flat task list

use super::shape::{DocumentEntry, ManifestShape, detect_shape};
use super::{ManifestError, UploadTask};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Normalizes a manifest payload into an ordered task list.
///
/// Task `index` is the zero-based position across the full flattened
/// sequence. Document ids are freshly generated per call, so re-running on
/// the same input yields identical task lists except for the ids.
pub fn normalize(root: &Value) -> Result<Vec<UploadTask>, ManifestError> {
    let shape = detect_shape(root)?;
    debug!(shape = shape.name(), "Detected manifest shape");

    let mut tasks = Vec::new();

    match shape {
        ManifestShape::DocumentList(documents) => {
            for doc in &documents {
                let task = build_task(tasks.len(), doc, &BTreeMap::new(), None);
                tasks.push(task);
            }
        }
        ManifestShape::MultiApplication(manifest) => {
            for (app_idx, app) in manifest.applications.iter().enumerate() {
                let documents = match &app.documents {
                    Some(docs) if !docs.is_empty() => docs,
                    _ => {
                        warn!(
                            application = app_idx,
                            "Application has no documents, contributing zero tasks"
                        );
                        continue;
                    }
                };

                for doc in documents {
                    let task = build_task(
                        tasks.len(),
                        doc,
                        &manifest.request_headers,
                        app.application_metadata.clone(),
                    );
                    tasks.push(task);
                }
            }
        }
        ManifestShape::SingleApplication(manifest) => {
            for doc in &manifest.documents {
                let task = build_task(
                    tasks.len(),
                    doc,
                    &manifest.request_headers,
                    manifest.application_metadata.clone(),
                );
                tasks.push(task);
            }
        }
    }

    info!(count = tasks.len(), "Normalized manifest into upload tasks");
    Ok(tasks)
}

/// Reads a manifest file and normalizes it through the same shape pipeline.
pub fn normalize_file(path: &Path) -> Result<Vec<UploadTask>, ManifestError> {
    let bytes = std::fs::read(path).map_err(|source| ManifestError::Io {
        path: path.display().to_string(),
        source,
    })?;

    debug!(bytes = bytes.len(), path = %path.display(), "Read manifest file");

    let root: Value = serde_json::from_slice(&bytes).map_err(|source| ManifestError::Syntax {
        path: path.display().to_string(),
        source,
    })?;

    normalize(&root)
}

/// Builds one task from a document entry.
///
/// Header merge: shared `requestHeaders` first, then the task-local entries
/// overlaid so the more specific scope wins. Metadata passes through
/// untouched; a missing metadata node becomes an empty object.
fn build_task(
    index: usize,
    doc: &DocumentEntry,
    request_headers: &BTreeMap<String, String>,
    application_metadata: Option<Value>,
) -> UploadTask {
    let mut task = UploadTask::new(index, Uuid::new_v4().to_string());

    task.file_path = doc.file_path.clone();
    if let Some(metadata) = &doc.metadata {
        task.metadata = metadata.clone();
    }
    task.application_metadata = application_metadata;

    let mut headers = request_headers.clone();
    for (name, value) in &doc.headers {
        headers.insert(name.clone(), value.clone());
    }
    task.header_overrides = headers;

    task
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn multi_application_flattens_in_order() {
        let root = json!({
            "requestHeaders": {"X-Tenant-Id": "t1"},
            "applications": [
                {
                    "applicationMetadata": {"app": "crm"},
                    "documents": [{"filePath": "a.pdf"}, {"filePath": "b.pdf"}]
                },
                {
                    "applicationMetadata": {"app": "billing"},
                    "documents": [{"filePath": "c.pdf"}]
                }
            ]
        });

        let tasks = normalize(&root).unwrap();

        assert_eq!(tasks.len(), 3);
        let paths: Vec<_> = tasks.iter().map(|t| t.file_path.as_deref().unwrap()).collect();
        assert_eq!(paths, vec!["a.pdf", "b.pdf", "c.pdf"]);
        assert_eq!(
            tasks.iter().map(|t| t.index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert_eq!(tasks[0].application_metadata, Some(json!({"app": "crm"})));
        assert_eq!(tasks[2].application_metadata, Some(json!({"app": "billing"})));
    }

    #[test]
    fn request_headers_copied_to_every_task() {
        let root = json!({
            "requestHeaders": {"X-Tenant-Id": "t1", "X-User-Id": "u1"},
            "applications": [
                {"documents": [
                    {"filePath": "a.pdf"},
                    {"filePath": "b.pdf", "headers": {"X-User-Id": "override"}}
                ]}
            ]
        });

        let tasks = normalize(&root).unwrap();

        assert_eq!(tasks[0].header("X-Tenant-Id"), Some("t1"));
        assert_eq!(tasks[0].header("X-User-Id"), Some("u1"));
        // Task-local value wins over the shared default.
        assert_eq!(tasks[1].header("X-Tenant-Id"), Some("t1"));
        assert_eq!(tasks[1].header("X-User-Id"), Some("override"));
    }

    #[test]
    fn empty_application_contributes_zero_tasks() {
        let root = json!({
            "applications": [
                {"documents": []},
                {"applicationMetadata": {"app": "x"}},
                {"documents": [{"filePath": "only.pdf"}]}
            ]
        });

        let tasks = normalize(&root).unwrap();

        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].index, 0);
        assert_eq!(tasks[0].file_path.as_deref(), Some("only.pdf"));
    }

    #[test]
    fn single_application_manifest() {
        let root = json!({
            "requestHeaders": {"Cookie": "session=abc"},
            "applicationMetadata": {"app": "hr"},
            "documents": [{"filePath": "a.pdf", "metadata": {"title": "A"}}]
        });

        let tasks = normalize(&root).unwrap();

        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].metadata, json!({"title": "A"}));
        assert_eq!(tasks[0].application_metadata, Some(json!({"app": "hr"})));
        assert_eq!(tasks[0].header("Cookie"), Some("session=abc"));
    }

    #[test]
    fn document_list_manifest() {
        let root = json!([{"filePath": "missing.pdf", "metadata": {}}]);

        let tasks = normalize(&root).unwrap();

        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].file_path.as_deref(), Some("missing.pdf"));
        assert_eq!(tasks[0].metadata, json!({}));
        assert!(tasks[0].application_metadata.is_none());
    }

    #[test]
    fn missing_metadata_becomes_empty_object() {
        let tasks = normalize(&json!([{"filePath": "a.pdf"}])).unwrap();
        assert_eq!(tasks[0].metadata, json!({}));
    }

    #[test]
    fn document_ids_fresh_per_call() {
        let root = json!([{"filePath": "a.pdf"}, {"filePath": "b.pdf"}]);

        let first = normalize(&root).unwrap();
        let second = normalize(&root).unwrap();

        // Identical except for the freshly generated ids.
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.index, b.index);
            assert_eq!(a.file_path, b.file_path);
            assert_eq!(a.metadata, b.metadata);
            assert_eq!(a.header_overrides, b.header_overrides);
            assert_ne!(a.document_id, b.document_id);
        }
        assert_ne!(first[0].document_id, first[1].document_id);
    }

    #[test]
    fn unrecognized_root_fails_whole_call() {
        let err = normalize(&json!({"batches": []})).unwrap_err();
        assert!(matches!(err, ManifestError::Format(_)));
    }

    #[test]
    fn normalize_file_missing_path() {
        let err = normalize_file(Path::new("/nonexistent/manifest.json")).unwrap_err();
        assert!(matches!(err, ManifestError::Io { .. }));
    }

    #[test]
    fn normalize_file_invalid_json() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, b"{not json").unwrap();

        let err = normalize_file(&path).unwrap_err();
        assert!(matches!(err, ManifestError::Syntax { .. }));
    }

    #[test]
    fn normalize_file_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("manifest.json");
        std::fs::write(
            &path,
            serde_json::to_vec(&json!({
                "documents": [{"filePath": "a.pdf"}]
            }))
            .unwrap(),
        )
        .unwrap();

        let tasks = normalize_file(&path).unwrap();
        assert_eq!(tasks.len(), 1);
    }
}
