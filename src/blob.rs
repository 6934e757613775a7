//! Content-addressed blob storage.
//!
//! Every unique file content is stored exactly once under
//! `objects/blobs/<digest>`, raw and uncompressed. Objects are written
//! through [`crate::atomic::write_atomic`] and never modified afterwards.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use log::debug;

use crate::atomic::{replace_with, write_atomic};
use crate::error::{Error, Result};
use crate::hash::{self, Digest, DigestWriter};

/// Blob storage rooted at a directory.
#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the blob files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// On-disk location of the object for `digest`.
    pub fn path_for(&self, digest: &Digest) -> PathBuf {
        self.root.join(digest.to_hex())
    }

    pub fn contains(&self, digest: &Digest) -> bool {
        self.path_for(digest).is_file()
    }

    /// Store `content`, returning its digest.
    ///
    /// Storing content that is already present is a no-op. If an object
    /// with the same digest exists but holds different bytes, the store is
    /// corrupt and [`Error::IntegrityViolation`] is returned.
    pub fn put(&self, content: &[u8]) -> Result<Digest> {
        let digest = Digest::of(content);
        let path = self.path_for(&digest);

        match std::fs::read(&path) {
            Ok(existing) => {
                if existing != content {
                    return Err(Error::integrity(
                        digest,
                        "stored blob differs from new content with the same digest",
                    ));
                }
                debug!("blob {} already stored", digest.short());
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                write_atomic(&path, content)?;
                debug!("stored blob {} ({} bytes)", digest.short(), content.len());
            }
            Err(e) => return Err(Error::io(&path, e)),
        }
        Ok(digest)
    }

    /// Stream the file at `source` into the store under `expected`.
    ///
    /// `expected` is the digest the caller already computed for `source`.
    /// The copy is hashed as it is written and only persisted if it still
    /// matches; a file that changed in between fails with
    /// [`Error::IntegrityViolation`] and nothing is stored. An object that
    /// is already present is re-verified instead of copied again.
    pub fn put_file(&self, source: &Path, expected: &Digest) -> Result<()> {
        let dest = self.path_for(expected);
        if dest.is_file() {
            self.verify(expected)?;
            debug!("blob {} already stored", expected.short());
            return Ok(());
        }

        let mut input = std::fs::File::open(source).map_err(|e| Error::io(source, e))?;
        let mut changed = None;
        let mut size = 0u64;
        let copied = replace_with(&dest, |out| {
            let mut hasher = DigestWriter::new();
            let mut buffer = [0u8; 8192];
            loop {
                let n = input.read(&mut buffer)?;
                if n == 0 {
                    break;
                }
                hasher.write_all(&buffer[..n])?;
                out.write_all(&buffer[..n])?;
                size += n as u64;
            }
            let actual = hasher.finalize();
            if actual != *expected {
                changed = Some(actual);
                return Err(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "content changed while being stored",
                ));
            }
            Ok(())
        });

        if let Some(actual) = changed {
            return Err(Error::integrity(
                expected,
                format!("{} now hashes to {}", source.display(), actual),
            ));
        }
        copied?;
        debug!("stored blob {} ({} bytes)", expected.short(), size);
        Ok(())
    }

    /// Fetch the exact bytes stored under `digest`.
    ///
    /// The bytes are re-hashed on the way out, so a blob damaged on disk
    /// surfaces as [`Error::IntegrityViolation`] instead of bad data.
    pub fn get(&self, digest: &Digest) -> Result<Vec<u8>> {
        let path = self.path_for(digest);
        let data = match std::fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::not_found(format!("blob {}", digest)));
            }
            Err(e) => return Err(Error::io(&path, e)),
        };

        if Digest::of(&data) != *digest {
            return Err(Error::integrity(digest, "blob content does not match its digest"));
        }
        Ok(data)
    }

    /// Re-hash the stored object and check it against its name.
    pub fn verify(&self, digest: &Digest) -> Result<()> {
        let path = self.path_for(digest);
        if !path.is_file() {
            return Err(Error::not_found(format!("blob {}", digest)));
        }
        let actual = hash::hash_file(&path)?;
        if actual != *digest {
            return Err(Error::integrity(
                digest,
                format!("blob content hashes to {}", actual),
            ));
        }
        Ok(())
    }

    /// Every digest in the store, sorted.
    pub fn list(&self) -> Result<Vec<Digest>> {
        list_objects(&self.root)
    }
}

/// Collect the digests named by the files in an object directory.
///
/// Entries whose names are not digests (stray temp files) are skipped.
pub(crate) fn list_objects(dir: &Path) -> Result<Vec<Digest>> {
    let read_dir = match std::fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(vec![]),
        Err(e) => return Err(Error::io(dir, e)),
    };

    let mut out = Vec::new();
    for entry in read_dir {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        let name = entry.file_name();
        if let Some(digest) = name.to_str().and_then(|n| Digest::from_hex(n).ok()) {
            out.push(digest);
        }
    }
    out.sort();
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, BlobStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = BlobStore::new(dir.path().join("blobs"));
        std::fs::create_dir_all(store.root()).unwrap();
        (dir, store)
    }

    #[test]
    fn put_get_roundtrip() {
        let (_dir, store) = store();
        let d = store.put(b"hello").unwrap();
        assert_eq!(store.get(&d).unwrap(), b"hello");
    }

    #[test]
    fn empty_and_binary_content() {
        let (_dir, store) = store();
        let empty = store.put(b"").unwrap();
        let binary = store.put(b"\x00\xff\x00\n:").unwrap();
        assert_eq!(store.get(&empty).unwrap(), b"");
        assert_eq!(store.get(&binary).unwrap(), b"\x00\xff\x00\n:");
    }

    #[test]
    fn dedup_single_object() {
        let (_dir, store) = store();
        let a = store.put(b"same").unwrap();
        let b = store.put(b"same").unwrap();
        assert_eq!(a, b);
        assert_eq!(store.list().unwrap(), vec![a]);
    }

    #[test]
    fn get_missing_is_not_found() {
        let (_dir, store) = store();
        let err = store.get(&Digest::of(b"never stored")).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn put_detects_conflicting_object() {
        let (_dir, store) = store();
        let d = store.put(b"original").unwrap();
        std::fs::write(store.path_for(&d), b"tampered").unwrap();
        let err = store.put(b"original").unwrap_err();
        assert!(matches!(err, Error::IntegrityViolation { .. }));
    }

    #[test]
    fn get_detects_tampering() {
        let (_dir, store) = store();
        let d = store.put(b"original").unwrap();
        std::fs::write(store.path_for(&d), b"tampered").unwrap();
        assert!(matches!(store.get(&d), Err(Error::IntegrityViolation { .. })));
        assert!(matches!(store.verify(&d), Err(Error::IntegrityViolation { .. })));
    }

    #[test]
    fn put_file_streams_content() {
        let (dir, store) = store();
        let source = dir.path().join("input.bin");
        std::fs::write(&source, b"streamed bytes").unwrap();
        let d = hash::hash_file(&source).unwrap();

        store.put_file(&source, &d).unwrap();
        assert_eq!(d, Digest::of(b"streamed bytes"));
        assert_eq!(store.get(&d).unwrap(), b"streamed bytes");
        // Second store of the same content is a no-op.
        store.put_file(&source, &d).unwrap();
        assert_eq!(store.list().unwrap(), vec![d]);
    }

    #[test]
    fn put_file_rejects_changed_source() {
        let (dir, store) = store();
        let source = dir.path().join("input.txt");
        std::fs::write(&source, b"before").unwrap();
        let d = hash::hash_file(&source).unwrap();
        std::fs::write(&source, b"after").unwrap();

        let err = store.put_file(&source, &d).unwrap_err();
        assert!(matches!(err, Error::IntegrityViolation { .. }));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn list_skips_foreign_files() {
        let (_dir, store) = store();
        let d = store.put(b"x").unwrap();
        std::fs::write(store.root().join(".tmpXYZ"), b"junk").unwrap();
        assert_eq!(store.list().unwrap(), vec![d]);
    }
}
