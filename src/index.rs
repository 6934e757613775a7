//! The tracking index: paths staged for the next commit.
//!
//! Persisted as one path per line, sorted, in `<root>/index`. The index is
//! loaded into a [`TrackingIndex`] value for each operation and written
//! back atomically; nothing is kept in process-wide state.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use log::debug;

use crate::atomic::write_atomic;
use crate::error::{Error, Result};
use crate::paths::validate_tracked_path;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackingIndex {
    paths: BTreeSet<String>,
}

impl TrackingIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the index file. A missing file reads as an empty index.
    pub fn load(file: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(file) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(e) => return Err(Error::io(file, e)),
        };
        let paths = content
            .lines()
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Ok(Self { paths })
    }

    /// Write the index file atomically.
    pub fn save(&self, file: &Path) -> Result<()> {
        let mut out = String::new();
        for p in &self.paths {
            out.push_str(p);
            out.push('\n');
        }
        write_atomic(file, out.as_bytes())
    }

    /// Validate `paths` against `work_dir` and merge them in.
    ///
    /// Every path must name an existing regular file (symlinks are not
    /// followed). Nothing is merged unless all of them pass.
    ///
    /// # Arguments
    /// * `work_dir` - Directory the paths are relative to.
    /// * `repo_dir` - Name of the repository directory inside `work_dir`.
    /// * `paths` - User-supplied paths.
    ///
    /// # Errors
    /// Returns [`Error::InvalidTarget`] for the first offending path.
    pub fn add_paths<S: AsRef<str>>(
        &mut self,
        work_dir: &Path,
        repo_dir: &str,
        paths: &[S],
    ) -> Result<()> {
        let mut validated = Vec::with_capacity(paths.len());
        for raw in paths {
            let raw = raw.as_ref();
            let norm = validate_tracked_path(raw, repo_dir)?;
            let full = work_dir.join(&norm);
            let meta = match std::fs::symlink_metadata(&full) {
                Ok(m) => m,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Err(Error::invalid_target(raw, "no such file"));
                }
                Err(e) => return Err(Error::invalid_target(raw, e.to_string())),
            };
            if meta.is_dir() {
                return Err(Error::invalid_target(raw, "is a directory"));
            }
            if !meta.file_type().is_file() {
                return Err(Error::invalid_target(raw, "not a regular file"));
            }
            validated.push(norm);
        }

        for p in validated {
            if self.paths.insert(p.clone()) {
                debug!("tracking {}", p);
            }
        }
        Ok(())
    }

    /// Tracked paths in sorted order.
    pub fn list(&self) -> Vec<String> {
        self.paths.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn clear(&mut self) {
        self.paths.clear();
    }

    /// Absolute locations of the tracked files.
    pub fn resolve(&self, work_dir: &Path) -> Vec<(String, PathBuf)> {
        self.paths
            .iter()
            .map(|p| (p.clone(), work_dir.join(p)))
            .collect()
    }
}
