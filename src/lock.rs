use std::path::Path;

use fs2::FileExt;

use crate::error::{Error, Result};

/// Acquire an advisory file lock on the repository, execute `f`, then release.
///
/// Locks `<root>/lock` with `fs2`. The lock is not waited for: if another
/// process holds it the call fails at once, leaving the repository alone.
///
/// # Arguments
/// * `root` - Path to the repository directory.
/// * `f` - Closure to execute while the lock is held.
///
/// # Errors
/// Returns [`Error::Locked`] if the lock is held elsewhere.
pub fn with_repo_lock<F, T>(root: &Path, f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let lock_path = root.join("lock");
    let file = std::fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&lock_path)
        .map_err(|e| Error::io(&lock_path, e))?;

    file.try_lock_exclusive()
        .map_err(|_| Error::Locked(lock_path.clone()))?;

    let result = f();
    let _ = file.unlock();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_closure_and_releases() {
        let dir = tempfile::tempdir().unwrap();
        let v = with_repo_lock(dir.path(), || Ok(41 + 1)).unwrap();
        assert_eq!(v, 42);
        // Released: taking it again succeeds.
        with_repo_lock(dir.path(), || Ok(())).unwrap();
    }

    #[test]
    fn held_lock_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let holder = std::fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(dir.path().join("lock"))
            .unwrap();
        holder.lock_exclusive().unwrap();

        let err = with_repo_lock(dir.path(), || Ok(())).unwrap_err();
        assert!(matches!(err, Error::Locked(_)));
        holder.unlock().unwrap();
    }
}
