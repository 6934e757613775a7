use std::path::{Path, PathBuf};

use log::debug;

use crate::atomic::write_atomic;
use crate::blob::list_objects;
use crate::error::{Error, Result};
use crate::hash::{self, Digest};
use crate::snapshot::SnapshotRecord;

/// Shortest prefix accepted by [`CommitStore::resolve`].
pub const MIN_PREFIX_LEN: usize = 4;

/// Snapshot records keyed by commit digest, under `objects/commits/`.
#[derive(Debug, Clone)]
pub struct CommitStore {
    root: PathBuf,
}

impl CommitStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, digest: &Digest) -> PathBuf {
        self.root.join(digest.to_hex())
    }

    pub fn contains(&self, digest: &Digest) -> bool {
        self.path_for(digest).is_file()
    }

    /// Persist `record` unless a commit with the same digest already exists.
    ///
    /// Returns the commit digest and whether a new object was written.
    pub fn put(&self, record: &SnapshotRecord) -> Result<(Digest, bool)> {
        let text = record.encode();
        let digest = Digest::of(text.as_bytes());

        if self.contains(&digest) {
            debug!("commit {} already stored", digest.short());
            return Ok((digest, false));
        }
        write_atomic(&self.path_for(&digest), text.as_bytes())?;
        debug!("stored commit {} ({} entries)", digest.short(), record.len());
        Ok((digest, true))
    }

    /// Load and decode the record for `digest`.
    ///
    /// # Errors
    /// [`Error::CommitNotFound`] if absent, [`Error::IntegrityViolation`] if
    /// the stored text no longer hashes to `digest`, [`Error::CorruptRecord`]
    /// if it cannot be decoded.
    pub fn get(&self, digest: &Digest) -> Result<SnapshotRecord> {
        let path = self.path_for(digest);
        let bytes = match std::fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::commit_not_found(digest.to_hex()));
            }
            Err(e) => return Err(Error::io(&path, e)),
        };

        if Digest::of(&bytes) != *digest {
            return Err(Error::integrity(digest, "commit record does not match its digest"));
        }
        let text = String::from_utf8(bytes)
            .map_err(|_| Error::corrupt(digest.to_hex(), "record is not valid UTF-8"))?;
        SnapshotRecord::decode(&digest.to_hex(), &text)
    }

    /// Every commit digest in the store, sorted.
    pub fn list(&self) -> Result<Vec<Digest>> {
        list_objects(&self.root)
    }

    /// Turn a full digest or a unique hex prefix into a commit digest.
    ///
    /// # Errors
    /// [`Error::CommitNotFound`] when nothing matches (including input that
    /// is not hex or is shorter than [`MIN_PREFIX_LEN`]),
    /// [`Error::AmbiguousDigest`] when several commits share the prefix.
    pub fn resolve(&self, rev: &str) -> Result<Digest> {
        let rev = rev.trim();
        if rev.len() < MIN_PREFIX_LEN || rev.len() > hash::HEX_LEN || !hash::is_hex(rev) {
            return Err(Error::commit_not_found(rev));
        }

        if rev.len() == hash::HEX_LEN {
            let digest = Digest::from_hex(rev)?;
            if self.contains(&digest) {
                return Ok(digest);
            }
            return Err(Error::commit_not_found(rev));
        }

        let prefix = rev.to_ascii_lowercase();
        let matches: Vec<Digest> = self
            .list()?
            .into_iter()
            .filter(|d| d.to_hex().starts_with(&prefix))
            .collect();

        match matches.as_slice() {
            [] => Err(Error::commit_not_found(rev)),
            [one] => Ok(*one),
            many => Err(Error::AmbiguousDigest {
                prefix: rev.to_string(),
                candidates: many.iter().map(|d| d.short()).collect(),
            }),
        }
    }
}
