use std::path::PathBuf;

/// All errors produced by snapvcs.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("not a snapvcs repository (run `init` first): {0}")]
    NoRepository(PathBuf),

    #[error("invalid target {path}: {reason}")]
    InvalidTarget { path: String, reason: String },

    #[error("nothing tracked: add files before committing")]
    NothingTracked,

    #[error("cannot read {path}: {source}")]
    UnreadableFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("integrity violation for object {digest}: {reason}")]
    IntegrityViolation { digest: String, reason: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("commit not found: {0}")]
    CommitNotFound(String),

    #[error("missing blob {digest} for {path}")]
    MissingBlob { path: String, digest: String },

    #[error("corrupt record {object}: {reason}")]
    CorruptRecord { object: String, reason: String },

    #[error("invalid digest width: {0} bits (expected 1..=256)")]
    InvalidWidth(u32),

    #[error("invalid digest: {0}")]
    InvalidDigest(String),

    #[error("ambiguous digest prefix {prefix}: matches {}", .candidates.join(", "))]
    AmbiguousDigest {
        prefix: String,
        candidates: Vec<String>,
    },

    #[error("invalid commit message: {0}")]
    InvalidMessage(String),

    #[error("repository is locked by another process: {0}")]
    Locked(PathBuf),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

// ---------------------------------------------------------------------------
// Convenience constructors
// ---------------------------------------------------------------------------

impl Error {
    pub fn no_repository(root: impl Into<PathBuf>) -> Self {
        Self::NoRepository(root.into())
    }

    pub fn invalid_target(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTarget {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn unreadable(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::UnreadableFile {
            path: path.into(),
            source,
        }
    }

    pub fn integrity(digest: impl ToString, reason: impl Into<String>) -> Self {
        Self::IntegrityViolation {
            digest: digest.to_string(),
            reason: reason.into(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn commit_not_found(rev: impl Into<String>) -> Self {
        Self::CommitNotFound(rev.into())
    }

    pub fn missing_blob(path: impl Into<String>, digest: impl ToString) -> Self {
        Self::MissingBlob {
            path: path.into(),
            digest: digest.to_string(),
        }
    }

    pub fn corrupt(object: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CorruptRecord {
            object: object.into(),
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io(std::io::Error::new(
            err.kind(),
            format!("{}: {}", path.into().display(), err),
        ))
    }

    /// `true` for errors that mean "the thing asked for does not exist".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::CommitNotFound(_) | Self::MissingBlob { .. }
        )
    }
}
