use std::path::Path;

use crate::error::{Error, Result};

/// Separator between path and digest in a snapshot record line.
pub const RECORD_DELIMITER: char = ':';

/// Normalize a tracked path: collapse `.` segments and repeated slashes,
/// reject `..`, absolute paths, and characters that would break the
/// line-based record and index formats.
///
/// # Arguments
/// * `path` - The path as given by the user, relative to the working directory.
///
/// # Errors
/// Returns [`Error::InvalidTarget`] describing the first rule violated.
pub fn normalize_tracked_path(path: &str) -> Result<String> {
    if path.is_empty() {
        return Err(Error::invalid_target(path, "path must not be empty"));
    }

    for ch in path.chars() {
        match ch {
            RECORD_DELIMITER | '\n' | '\r' | '\0' => {
                return Err(Error::invalid_target(
                    path,
                    format!("path contains reserved character {:?}", ch),
                ));
            }
            _ => {}
        }
    }

    if path.starts_with('/') || Path::new(path).is_absolute() {
        return Err(Error::invalid_target(
            path,
            "path must be relative to the working directory",
        ));
    }

    let mut segments: Vec<&str> = Vec::new();
    for seg in path.split('/') {
        match seg {
            "" | "." => continue,
            ".." => {
                return Err(Error::invalid_target(path, "path segment '..' is not allowed"));
            }
            _ => segments.push(seg),
        }
    }

    if segments.is_empty() {
        return Err(Error::invalid_target(path, "path does not name a file"));
    }

    Ok(segments.join("/"))
}

/// Like [`normalize_tracked_path`], and also refuse anything under the
/// repository directory `repo_dir` (its name relative to the working
/// directory).
pub fn validate_tracked_path(path: &str, repo_dir: &str) -> Result<String> {
    let norm = normalize_tracked_path(path)?;
    let first = norm.split('/').next().unwrap_or_default();
    if first == repo_dir {
        return Err(Error::invalid_target(
            path,
            "path is inside the repository directory",
        ));
    }
    Ok(norm)
}

/// Reject commit messages that cannot be stored in the line-based log.
pub fn validate_message(message: &str) -> Result<()> {
    if message.contains('\n') || message.contains('\r') {
        return Err(Error::InvalidMessage(
            "message must be a single line".to_string(),
        ));
    }
    Ok(())
}
