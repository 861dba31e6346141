// ─── Filesystem Helpers ───
// Atomic saves and soft/idempotent deletes used by the patch store.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::core::error::{LauncherError, LauncherResult};

/// Create `path`'s parent directory if it is missing.
pub fn ensure_parent_dir(path: &Path) -> LauncherResult<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    Ok(())
}

pub fn ensure_dir(path: &Path) -> LauncherResult<()> {
    std::fs::create_dir_all(path).map_err(|e| LauncherError::io(path, e))
}

/// Write `data` to `path` with replace semantics.
///
/// The bytes go to a temporary file in the same directory which is then
/// renamed over the target, so readers observe either the old or the new
/// content. A failed commit removes the temporary file.
pub fn atomic_write(path: &Path, data: &[u8]) -> LauncherResult<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    // Temp files start owner-only; keep the target's mode instead.
    let permissions = match std::fs::metadata(path) {
        Ok(meta) => Some(meta.permissions()),
        Err(_) => default_permissions(),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| LauncherError::io(dir, e))?;
    tmp.write_all(data)
        .and_then(|_| match permissions {
            Some(p) => tmp.as_file().set_permissions(p),
            None => Ok(()),
        })
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| LauncherError::io(tmp.path(), e))?;
    tmp.persist(path)
        .map_err(|e| LauncherError::io(path, e.error))?;
    Ok(())
}

#[cfg(unix)]
fn default_permissions() -> Option<std::fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(std::fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn default_permissions() -> Option<std::fs::Permissions> {
    None
}

/// `<path>.old`, the soft-delete name for superseded files.
pub fn old_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".old");
    PathBuf::from(name)
}

/// Rename `path` to `<path>.old`.
pub fn rename_to_old(path: &Path) -> LauncherResult<PathBuf> {
    let target = old_path(path);
    std::fs::rename(path, &target).map_err(|e| LauncherError::io(path, e))?;
    Ok(target)
}

/// Remove a file, treating "already absent" as success.
///
/// Returns whether a file was actually removed.
pub fn remove_file_if_exists(path: &Path) -> LauncherResult<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(LauncherError::io(path, e)),
    }
}
