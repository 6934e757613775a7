use std::io::Write;
use std::path::Path;

use crate::atomic::replace_with;
use crate::error::{Error, Result};
use crate::hash::Digest;
use crate::types::HistoryEntry;

/// Prefix of the first line of every log entry.
pub const HASH_PREFIX: &str = "Commit hash: ";
/// Prefix of the second line of every log entry.
pub const MESSAGE_PREFIX: &str = "Commit message: ";

/// Read all history entries, oldest first.
///
/// Parses `<root>/log` two lines at a time. Returns an empty vec if the
/// log file does not exist.
///
/// # Arguments
/// * `log_path` - Path to the log file.
///
/// # Errors
/// Returns [`Error::CorruptRecord`] if a line is missing its prefix or an
/// entry is cut short.
pub fn read_history(log_path: &Path) -> Result<Vec<HistoryEntry>> {
    let content = match std::fs::read_to_string(log_path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(vec![]),
        Err(e) => return Err(Error::io(log_path, e)),
    };

    let object = log_path.display().to_string();
    let mut entries = Vec::new();
    let mut lines = content.lines().enumerate();

    while let Some((n, hash_line)) = lines.next() {
        let hex = hash_line.strip_prefix(HASH_PREFIX).ok_or_else(|| {
            Error::corrupt(&object, format!("line {}: expected {:?}", n + 1, HASH_PREFIX))
        })?;
        let commit = Digest::from_hex(hex)
            .map_err(|e| Error::corrupt(&object, format!("line {}: {}", n + 1, e)))?;

        let (n, message_line) = lines.next().ok_or_else(|| {
            Error::corrupt(&object, format!("line {}: entry has no message line", n + 1))
        })?;
        let message = message_line.strip_prefix(MESSAGE_PREFIX).ok_or_else(|| {
            Error::corrupt(&object, format!("line {}: expected {:?}", n + 1, MESSAGE_PREFIX))
        })?;

        entries.push(HistoryEntry {
            commit,
            message: message.to_string(),
        });
    }

    Ok(entries)
}

/// Append one entry to the log.
///
/// The existing log is streamed into a temp file next to it, the new entry
/// is added, and the result is renamed over the log, so an interrupted
/// append never leaves a truncated log behind.
///
/// # Arguments
/// * `log_path` - Path to the log file.
/// * `entry` - The [`HistoryEntry`] to append. Its message must be one line.
pub fn append_history(log_path: &Path, entry: &HistoryEntry) -> Result<()> {
    crate::paths::validate_message(&entry.message)?;

    let existing = match std::fs::File::open(log_path) {
        Ok(f) => Some(f),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => return Err(Error::io(log_path, e)),
    };

    replace_with(log_path, |out| {
        if let Some(mut f) = existing {
            std::io::copy(&mut f, out)?;
        }
        writeln!(out, "{}{}", HASH_PREFIX, entry.commit)?;
        writeln!(out, "{}{}", MESSAGE_PREFIX, entry.message)?;
        Ok(())
    })
}
