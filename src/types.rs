use crate::error::{Error, Result};
use crate::hash::Digest;

/// Default name of the repository directory inside the working directory.
pub const DEFAULT_REPO_DIR: &str = ".vcs";

// ---------------------------------------------------------------------------
// OpenOptions
// ---------------------------------------------------------------------------

/// Options for opening or creating a [`crate::Repository`].
#[derive(Debug, Clone, Default)]
pub struct OpenOptions {
    /// Initialize the repository if it doesn't exist.
    pub create: bool,
    /// Repository directory name, relative to the working directory.
    /// Defaults to [`DEFAULT_REPO_DIR`].
    pub dir: Option<String>,
}

// ---------------------------------------------------------------------------
// HistoryEntry
// ---------------------------------------------------------------------------

/// One entry of the history log.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct HistoryEntry {
    pub commit: Digest,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Checkout
// ---------------------------------------------------------------------------

/// How checkout reacts to an entry it cannot restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckoutMode {
    /// Fetch and verify every blob first; write nothing if any is missing.
    #[default]
    Strict,
    /// Restore each entry independently and record failures in the report.
    BestEffort,
}

#[derive(Debug, Clone, Default)]
pub struct CheckoutOptions {
    pub mode: CheckoutMode,
}

impl CheckoutOptions {
    pub fn best_effort() -> Self {
        Self {
            mode: CheckoutMode::BestEffort,
        }
    }
}

/// A single entry that checkout failed to restore.
#[derive(Debug)]
pub struct CheckoutError {
    pub path: String,
    pub error: Error,
}

/// Outcome of a checkout.
#[derive(Debug, Default)]
pub struct CheckoutReport {
    pub commit: Option<Digest>,
    /// Paths written to the working directory, in record order.
    pub restored: Vec<String>,
    pub errors: Vec<CheckoutError>,
}

impl CheckoutReport {
    pub fn new(commit: Digest) -> Self {
        Self {
            commit: Some(commit),
            ..Default::default()
        }
    }

    /// `true` when every entry was restored.
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    /// Consume the report and return the first recorded error, if any.
    pub fn finalize(mut self) -> Result<Self> {
        if self.is_complete() {
            Ok(self)
        } else {
            Err(self.errors.remove(0).error)
        }
    }
}

// ---------------------------------------------------------------------------
// FsckReport
// ---------------------------------------------------------------------------

/// A problem found by [`crate::Repository::fsck`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsckProblem {
    /// The object or file the problem was found in.
    pub object: String,
    pub message: String,
}

impl FsckProblem {
    pub fn new(object: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            object: object.into(),
            message: message.into(),
        }
    }
}

/// Summary of a full repository integrity check.
#[derive(Debug, Clone, Default)]
pub struct FsckReport {
    pub blobs_checked: usize,
    pub commits_checked: usize,
    pub log_entries_checked: usize,
    pub problems: Vec<FsckProblem>,
}

impl FsckReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_clean(&self) -> bool {
        self.problems.is_empty()
    }
}
