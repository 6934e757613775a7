//! A minimal local version-control engine.
//!
//! `snapvcs` tracks a chosen set of files, snapshots their contents into a
//! content-addressed object store, and records each snapshot as a commit in
//! an append-only history that can later be checked out again.
//!
//! # Key types
//!
//! - [`Repository`] - opens (or creates) the repository directory and runs
//!   `add`, `commit`, `log`, `checkout`, `show` and `fsck`.
//! - [`BlobStore`] - file contents stored once per SHA-256 [`Digest`].
//! - [`CommitStore`] - snapshot records keyed by the digest of their text.
//! - [`TrackingIndex`] - the paths staged for the next commit.
//!
//! # On-disk layout
//!
//! ```text
//! <work_dir>/.vcs/
//!   objects/blobs/<digest>     raw file content
//!   objects/commits/<digest>   "<path>:<digest>\n" per tracked file
//!   index                      one tracked path per line
//!   log                        "Commit hash: ..." / "Commit message: ..." pairs
//! ```
//!
//! # Quick example
//!
//! ```rust,no_run
//! use snapvcs::{Repository, OpenOptions, CheckoutOptions};
//!
//! let repo = Repository::init(".", OpenOptions::default()).unwrap();
//! repo.add(&["notes.txt"]).unwrap();
//! let commit = repo.commit("first snapshot").unwrap();
//!
//! std::fs::remove_file("notes.txt").unwrap();
//! repo.checkout(&commit.to_hex(), CheckoutOptions::default()).unwrap();
//! ```

pub mod atomic;
pub mod blob;
pub mod checkout;
pub mod commit;
pub mod error;
pub mod hash;
pub mod history;
pub mod index;
pub mod lock;
pub mod paths;
pub mod repo;
pub mod snapshot;
pub mod types;

// Re-export primary public types at crate root.
pub use error::{Error, Result};
pub use repo::Repository;
pub use blob::BlobStore;
pub use commit::CommitStore;
pub use index::TrackingIndex;
pub use hash::{digest, Digest};
pub use snapshot::{SnapshotEntry, SnapshotRecord};
pub use types::*;
