use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::blob::BlobStore;
use crate::commit::CommitStore;
use crate::error::{Error, Result};
use crate::hash::{hash_file, Digest};
use crate::history::{append_history, read_history};
use crate::index::TrackingIndex;
use crate::lock::with_repo_lock;
use crate::snapshot::SnapshotRecord;
use crate::types::{
    CheckoutOptions, CheckoutReport, FsckProblem, FsckReport, HistoryEntry, OpenOptions,
    DEFAULT_REPO_DIR,
};

/// A repository rooted at `<work_dir>/<dir>`.
///
/// The handle holds paths only. The tracking index and history log are
/// read from disk by each operation and written back before it returns.
#[derive(Debug, Clone)]
pub struct Repository {
    work_dir: PathBuf,
    dir_name: String,
    root: PathBuf,
    blobs: BlobStore,
    commits: CommitStore,
}

impl Repository {
    fn layout(work_dir: &Path, options: &OpenOptions) -> Self {
        let dir_name = options
            .dir
            .clone()
            .unwrap_or_else(|| DEFAULT_REPO_DIR.to_string());
        let root = work_dir.join(&dir_name);
        let objects = root.join("objects");
        Repository {
            work_dir: work_dir.to_path_buf(),
            dir_name,
            blobs: BlobStore::new(objects.join("blobs")),
            commits: CommitStore::new(objects.join("commits")),
            root,
        }
    }

    /// Create the repository layout under `work_dir`.
    ///
    /// Safe to call on an existing repository: directories and files that
    /// are already there are kept as they are.
    pub fn init(work_dir: impl AsRef<Path>, options: OpenOptions) -> Result<Self> {
        let repo = Self::layout(work_dir.as_ref(), &options);

        for dir in [repo.blobs.root(), repo.commits.root()] {
            std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
        }
        for file in [repo.index_path(), repo.log_path()] {
            if !file.exists() {
                crate::atomic::write_atomic(&file, b"")?;
            }
        }

        info!("initialized repository at {}", repo.root.display());
        Ok(repo)
    }

    /// Open an existing repository (or create it if `options.create`).
    pub fn open(work_dir: impl AsRef<Path>, options: OpenOptions) -> Result<Self> {
        let work_dir = work_dir.as_ref();
        let repo = Self::layout(work_dir, &options);
        if repo.is_initialized() {
            return Ok(repo);
        }
        if options.create {
            return Self::init(work_dir, options);
        }
        Err(Error::no_repository(repo.root))
    }

    fn is_initialized(&self) -> bool {
        self.blobs.root().is_dir()
            && self.commits.root().is_dir()
            && self.index_path().is_file()
            && self.log_path().is_file()
    }

    fn require_initialized(&self) -> Result<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(Error::no_repository(&self.root))
        }
    }

    /// Directory the tracked paths are relative to.
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Repository directory (`<work_dir>/.vcs` by default).
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join("index")
    }

    pub fn log_path(&self) -> PathBuf {
        self.root.join("log")
    }

    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    pub fn commits(&self) -> &CommitStore {
        &self.commits
    }

    // -----------------------------------------------------------------------
    // Tracking
    // -----------------------------------------------------------------------

    /// Start tracking `paths`, returning the full tracked list.
    ///
    /// Either every path is added or, on the first invalid one, none are.
    pub fn add<S: AsRef<str>>(&self, paths: &[S]) -> Result<Vec<String>> {
        self.require_initialized()?;
        with_repo_lock(&self.root, || {
            let mut index = TrackingIndex::load(&self.index_path())?;
            index.add_paths(&self.work_dir, &self.dir_name, paths)?;
            index.save(&self.index_path())?;
            Ok(index.list())
        })
    }

    /// Paths staged for the next commit, sorted.
    pub fn tracked(&self) -> Result<Vec<String>> {
        self.require_initialized()?;
        Ok(TrackingIndex::load(&self.index_path())?.list())
    }

    // -----------------------------------------------------------------------
    // Commit
    // -----------------------------------------------------------------------

    /// Snapshot every tracked file and record the snapshot in the history.
    ///
    /// All tracked files are hashed before anything is written, so an
    /// unreadable file leaves the repository exactly as it was. Contents are
    /// then streamed into the blob store; a file modified between the two
    /// passes fails with [`Error::IntegrityViolation`] before any commit or
    /// log entry is written. Committing
    /// content identical to an existing commit reuses that commit's digest
    /// and still adds a log entry.
    ///
    /// # Errors
    /// [`Error::NoRepository`], [`Error::InvalidMessage`],
    /// [`Error::NothingTracked`], [`Error::UnreadableFile`], or any storage
    /// error.
    pub fn commit(&self, message: &str) -> Result<Digest> {
        self.require_initialized()?;
        crate::paths::validate_message(message)?;

        with_repo_lock(&self.root, || {
            let mut index = TrackingIndex::load(&self.index_path())?;
            if index.is_empty() {
                return Err(Error::NothingTracked);
            }

            // Hash every file before storing any of them.
            let mut files = Vec::with_capacity(index.len());
            let mut record = SnapshotRecord::new();
            for (path, full) in index.resolve(&self.work_dir) {
                let digest = hash_file(&full).map_err(|e| match e {
                    Error::Io(source) => Error::unreadable(&path, source),
                    other => other,
                })?;
                record.insert(path.as_str(), digest);
                files.push((full, digest));
            }

            for (full, digest) in &files {
                self.blobs.put_file(full, digest)?;
            }

            let (digest, created) = self.commits.put(&record)?;
            if !created {
                debug!("commit {} matches an existing snapshot", digest.short());
            }

            append_history(
                &self.log_path(),
                &HistoryEntry {
                    commit: digest,
                    message: message.to_string(),
                },
            )?;

            index.clear();
            index.save(&self.index_path())?;

            info!("committed {} ({} files)", digest.short(), record.len());
            Ok(digest)
        })
    }

    // -----------------------------------------------------------------------
    // History / inspection
    // -----------------------------------------------------------------------

    /// All history entries, oldest first.
    pub fn log(&self) -> Result<Vec<HistoryEntry>> {
        self.require_initialized()?;
        read_history(&self.log_path())
    }

    /// Resolve a full digest or unique prefix to a commit digest.
    pub fn resolve(&self, rev: &str) -> Result<Digest> {
        self.require_initialized()?;
        self.commits.resolve(rev)
    }

    /// Decode the snapshot record of a commit.
    pub fn show(&self, rev: &str) -> Result<SnapshotRecord> {
        let digest = self.resolve(rev)?;
        self.commits.get(&digest)
    }

    // -----------------------------------------------------------------------
    // Checkout
    // -----------------------------------------------------------------------

    /// Restore the files of commit `rev` into the working directory.
    ///
    /// See [`crate::checkout::checkout`] for the strict and best-effort
    /// modes.
    pub fn checkout(&self, rev: &str, options: CheckoutOptions) -> Result<CheckoutReport> {
        let digest = self.resolve(rev)?;
        with_repo_lock(&self.root, || {
            crate::checkout::checkout(
                &self.commits,
                &self.blobs,
                &self.work_dir,
                &self.dir_name,
                &digest,
                &options,
            )
        })
    }

    // -----------------------------------------------------------------------
    // Integrity
    // -----------------------------------------------------------------------

    /// Check every stored object and log entry.
    ///
    /// Problems are collected in the report rather than returned as errors;
    /// an `Err` means the check itself could not run.
    pub fn fsck(&self) -> Result<FsckReport> {
        self.require_initialized()?;
        let mut report = FsckReport::new();

        for digest in self.blobs.list()? {
            report.blobs_checked += 1;
            if let Err(e) = self.blobs.verify(&digest) {
                report
                    .problems
                    .push(FsckProblem::new(format!("blob {}", digest), e.to_string()));
            }
        }

        for digest in self.commits.list()? {
            report.commits_checked += 1;
            let object = format!("commit {}", digest);
            let record = match self.commits.get(&digest) {
                Ok(r) => r,
                Err(e) => {
                    report.problems.push(FsckProblem::new(object, e.to_string()));
                    continue;
                }
            };
            for entry in record.entries() {
                if !self.blobs.contains(&entry.digest) {
                    report.problems.push(FsckProblem::new(
                        object.clone(),
                        Error::missing_blob(&entry.path, entry.digest).to_string(),
                    ));
                }
            }
        }

        match read_history(&self.log_path()) {
            Ok(entries) => {
                for entry in entries {
                    report.log_entries_checked += 1;
                    if !self.commits.contains(&entry.commit) {
                        let message = format!(
                            "entry {:?} points to missing commit {}",
                            entry.message, entry.commit
                        );
                        report.problems.push(FsckProblem::new("log", message));
                    }
                }
            }
            Err(e) => report.problems.push(FsckProblem::new("log", e.to_string())),
        }

        info!(
            "fsck: {} blobs, {} commits, {} log entries, {} problems",
            report.blobs_checked,
            report.commits_checked,
            report.log_entries_checked,
            report.problems.len()
        );
        Ok(report)
    }
}
