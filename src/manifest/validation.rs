//! Pre-upload task validation
//!
//! Validation never fails the run by itself: it annotates each task's
//! validity fields and returns advisory diagnostics. Whether an invalid
//! task is skipped or treated as a failure is decided by the executor's
//! policy downstream.

use super::UploadTask;
use std::fs;
use std::path::Path;
use tracing::warn;

/// Validates every task's referenced file, in task order.
///
/// Per task: blank path, existence, regular-file check, readability, then
/// the configured size limit. The first failed check wins and the task is
/// annotated invalid with its reason.
pub fn validate_tasks(tasks: &mut [UploadTask], max_file_size_bytes: u64) -> Vec<String> {
    let mut diagnostics = Vec::new();

    for task in tasks.iter_mut() {
        let Some(path_str) = task.file_path.as_deref().filter(|p| !p.trim().is_empty()) else {
            diagnostics.push(format!("Task[{}]: Missing file path", task.index));
            mark_invalid(task, "File path not specified");
            continue;
        };

        let path = Path::new(path_str);

        let metadata = match fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(_) => {
                diagnostics.push(format!("Task[{}]: File not found: {}", task.index, path_str));
                mark_invalid(task, "File not found");
                continue;
            }
        };

        if !metadata.is_file() {
            diagnostics.push(format!(
                "Task[{}]: Path is not a file: {}",
                task.index, path_str
            ));
            mark_invalid(task, "Path is not a file");
        } else if fs::File::open(path).is_err() {
            diagnostics.push(format!(
                "Task[{}]: File not readable: {}",
                task.index, path_str
            ));
            mark_invalid(task, "File not readable");
        } else if metadata.len() > max_file_size_bytes {
            diagnostics.push(format!(
                "Task[{}]: File too large ({} bytes): {}",
                task.index,
                metadata.len(),
                path_str
            ));
            mark_invalid(task, "File exceeds maximum size limit");
        } else {
            task.file_valid = true;
            task.file_validation_error = None;
        }
    }

    if !diagnostics.is_empty() {
        warn!(issues = diagnostics.len(), "Manifest validation found issues");
    }

    diagnostics
}

fn mark_invalid(task: &mut UploadTask, reason: &str) {
    task.file_valid = false;
    task.file_validation_error = Some(reason.to_string());
}
