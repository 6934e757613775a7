use std::io::Write;
use std::path::Path;

use tempfile::{Builder, NamedTempFile};

use crate::error::{Error, Result};

/// Replace `path` with `data` so readers see either the old or the new
/// contents, never a partial write.
///
/// The data goes to a temp file in the same directory, is fsynced, and is
/// renamed over `path`. An existing file keeps its permission bits; a new
/// file gets the usual `0o666` minus the process umask.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    replace_with(path, |f| f.write_all(data))
}

/// Like [`write_atomic`], but lets `fill` stream the contents into the
/// temp file.
pub fn replace_with<F>(path: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&mut std::fs::File) -> std::io::Result<()>,
{
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = temp_file_for(path, parent)?;
    fill(tmp.as_file_mut()).map_err(|e| Error::io(tmp.path(), e))?;
    tmp.as_file().sync_all().map_err(|e| Error::io(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| Error::io(path, e.error))?;

    // Directory fsync is best effort; some filesystems refuse it.
    if let Ok(dir) = std::fs::File::open(parent) {
        let _ = dir.sync_all();
    }
    Ok(())
}

/// Create the temp file that will replace `path`, carrying over the
/// permissions `path` has now.
fn temp_file_for(path: &Path, parent: &Path) -> Result<NamedTempFile> {
    let existing = match std::fs::metadata(path) {
        Ok(meta) => Some(meta.permissions()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => return Err(Error::io(path, e)),
    };

    let mut builder = Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // open(2) applies the umask to this mode.
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    let tmp = builder.tempfile_in(parent).map_err(|e| Error::io(parent, e))?;

    #[cfg(unix)]
    if let Some(perms) = existing {
        tmp.as_file()
            .set_permissions(perms)
            .map_err(|e| Error::io(tmp.path(), e))?;
    }
    #[cfg(not(unix))]
    let _ = existing;

    Ok(tmp)
}
