use std::path::Path;

use log::{debug, info, warn};

use crate::atomic::write_atomic;
use crate::blob::BlobStore;
use crate::commit::CommitStore;
use crate::error::{Error, Result};
use crate::hash::Digest;
use crate::paths::validate_tracked_path;
use crate::snapshot::SnapshotEntry;
use crate::types::{CheckoutError, CheckoutMode, CheckoutOptions, CheckoutReport};

/// Restore every file recorded in `commit` into `work_dir`.
///
/// Existing files are overwritten in place of their old contents; missing
/// files and parent directories are created. Files that are not part of the
/// commit are left alone.
///
/// Every record path is checked again before anything is written. A path
/// that escapes `work_dir` or points into the repository directory
/// `repo_dir` fails the whole checkout with [`Error::CorruptRecord`].
///
/// In [`CheckoutMode::Strict`] all blobs are loaded before the first write,
/// so a missing blob aborts with [`Error::MissingBlob`] and the working
/// directory is untouched. In [`CheckoutMode::BestEffort`] each entry is
/// applied on its own and failures are collected in the report.
pub fn checkout(
    commits: &CommitStore,
    blobs: &BlobStore,
    work_dir: &Path,
    repo_dir: &str,
    commit: &Digest,
    options: &CheckoutOptions,
) -> Result<CheckoutReport> {
    let record = commits.get(commit)?;
    for entry in record.entries() {
        validate_tracked_path(&entry.path, repo_dir)
            .map_err(|e| Error::corrupt(commit.to_hex(), e.to_string()))?;
    }
    let mut report = CheckoutReport::new(*commit);

    match options.mode {
        CheckoutMode::Strict => {
            let mut staged = Vec::with_capacity(record.len());
            for entry in record.entries() {
                let data = fetch(blobs, &entry)?;
                staged.push((entry.path, data));
            }
            for (path, data) in staged {
                restore_file(work_dir, &path, &data)?;
                report.restored.push(path);
            }
        }
        CheckoutMode::BestEffort => {
            for entry in record.entries() {
                let outcome = fetch(blobs, &entry)
                    .and_then(|data| restore_file(work_dir, &entry.path, &data));
                match outcome {
                    Ok(()) => report.restored.push(entry.path),
                    Err(error) => {
                        warn!("checkout {}: skipping {}: {}", commit.short(), entry.path, error);
                        report.errors.push(CheckoutError {
                            path: entry.path,
                            error,
                        });
                    }
                }
            }
        }
    }

    info!(
        "checked out {}: {} restored, {} failed",
        commit.short(),
        report.restored.len(),
        report.errors.len()
    );
    Ok(report)
}

fn fetch(blobs: &BlobStore, entry: &SnapshotEntry) -> Result<Vec<u8>> {
    blobs.get(&entry.digest).map_err(|e| match e {
        Error::NotFound(_) => Error::missing_blob(&entry.path, entry.digest),
        other => other,
    })
}

fn restore_file(work_dir: &Path, rel_path: &str, data: &[u8]) -> Result<()> {
    let dest = work_dir.join(rel_path);
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    if dest.is_dir() {
        return Err(Error::io(
            &dest,
            std::io::Error::new(std::io::ErrorKind::Other, "a directory is in the way"),
        ));
    }
    write_atomic(&dest, data)?;
    debug!("restored {} ({} bytes)", rel_path, data.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::SnapshotRecord;

    const REPO_DIR: &str = ".vcs";

    struct Fixture {
        dir: tempfile::TempDir,
        blobs: BlobStore,
        commits: CommitStore,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let blobs = BlobStore::new(dir.path().join("blobs"));
            let commits = CommitStore::new(dir.path().join("commits"));
            std::fs::create_dir_all(blobs.root()).unwrap();
            std::fs::create_dir_all(commits.root()).unwrap();
            std::fs::create_dir_all(dir.path().join("work")).unwrap();
            Self { dir, blobs, commits }
        }

        fn work(&self) -> std::path::PathBuf {
            self.dir.path().join("work")
        }
    }

    #[test]
    fn restores_nested_paths() {
        let fx = Fixture::new();
        let mut record = SnapshotRecord::new();
        record.insert("deep/er/file.txt", fx.blobs.put(b"nested").unwrap());
        let (c, _) = fx.commits.put(&record).unwrap();

        let options = CheckoutOptions::default();
        let report =
            checkout(&fx.commits, &fx.blobs, &fx.work(), REPO_DIR, &c, &options).unwrap();
        assert_eq!(report.restored, vec!["deep/er/file.txt"]);
        assert_eq!(
            std::fs::read(fx.work().join("deep/er/file.txt")).unwrap(),
            b"nested"
        );
    }

    #[test]
    fn strict_writes_nothing_on_missing_blob() {
        let fx = Fixture::new();
        let mut record = SnapshotRecord::new();
        record.insert("a.txt", fx.blobs.put(b"present").unwrap());
        record.insert("b.txt", Digest::of(b"absent"));
        let (c, _) = fx.commits.put(&record).unwrap();

        let options = CheckoutOptions::default();
        let err =
            checkout(&fx.commits, &fx.blobs, &fx.work(), REPO_DIR, &c, &options).unwrap_err();
        assert!(matches!(err, Error::MissingBlob { ref path, .. } if path == "b.txt"));
        assert!(!fx.work().join("a.txt").exists());
    }

    #[test]
    fn best_effort_restores_the_rest() {
        let fx = Fixture::new();
        let mut record = SnapshotRecord::new();
        record.insert("a.txt", Digest::of(b"absent"));
        record.insert("b.txt", fx.blobs.put(b"present").unwrap());
        let (c, _) = fx.commits.put(&record).unwrap();

        let report = checkout(
            &fx.commits,
            &fx.blobs,
            &fx.work(),
            REPO_DIR,
            &c,
            &CheckoutOptions::best_effort(),
        )
        .unwrap();
        assert_eq!(report.restored, vec!["b.txt"]);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].path, "a.txt");
        assert_eq!(std::fs::read(fx.work().join("b.txt")).unwrap(), b"present");
        assert!(matches!(report.finalize(), Err(Error::MissingBlob { .. })));
    }

    #[test]
    fn unknown_commit() {
        let fx = Fixture::new();
        let err = checkout(
            &fx.commits,
            &fx.blobs,
            &fx.work(),
            REPO_DIR,
            &Digest::of(b"nope"),
            &Default::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::CommitNotFound(_)));
    }

    #[test]
    fn rejects_paths_inside_repo_dir() {
        let fx = Fixture::new();
        std::fs::create_dir_all(fx.work().join(REPO_DIR)).unwrap();
        std::fs::write(fx.work().join(".vcs/log"), b"keep").unwrap();
        let mut record = SnapshotRecord::new();
        record.insert("a.txt", fx.blobs.put(b"fine").unwrap());
        record.insert(".vcs/log", fx.blobs.put(b"clobbered").unwrap());
        let (c, _) = fx.commits.put(&record).unwrap();

        for options in [CheckoutOptions::default(), CheckoutOptions::best_effort()] {
            let err = checkout(&fx.commits, &fx.blobs, &fx.work(), REPO_DIR, &c, &options)
                .unwrap_err();
            assert!(matches!(err, Error::CorruptRecord { .. }));
        }
        assert_eq!(std::fs::read(fx.work().join(".vcs/log")).unwrap(), b"keep");
        assert!(!fx.work().join("a.txt").exists());
    }
}
