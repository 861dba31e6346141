// ─── Patch JSON Format ───
// Reading and writing patch fragments on disk.

use std::path::Path;

use tracing::warn;

use super::version_file::VersionFile;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::fs;

/// Parse a patch file from disk.
///
/// `require_order` is set for patches discovered by directory scan, whose
/// position comes from their intrinsic order. A missing `order` is logged and
/// treated as 0.
pub fn parse_json_file(path: &Path, require_order: bool) -> LauncherResult<VersionFile> {
    let raw = std::fs::read_to_string(path).map_err(|e| LauncherError::io(path, e))?;
    let value: serde_json::Value =
        serde_json::from_str(&raw).map_err(|e| LauncherError::MalformedPatch {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let Some(root) = value.as_object() else {
        return Err(LauncherError::MalformedPatch {
            path: path.to_path_buf(),
            reason: "top-level value is not an object".into(),
        });
    };

    if require_order && !root.contains_key("order") {
        warn!("{:?} doesn't have an order field", path);
    }

    let mut file: VersionFile =
        serde_json::from_value(value).map_err(|e| LauncherError::MalformedPatch {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    file.filename = path.to_path_buf();
    Ok(file)
}

/// Serialize a patch for storage.
pub fn to_json(file: &VersionFile) -> LauncherResult<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(file)?)
}

/// Persist a patch at `path` with atomic replace semantics.
pub fn save_patch(file: &VersionFile, path: &Path) -> LauncherResult<()> {
    let data = to_json(file)?;
    fs::atomic_write(path, &data)
}

/// Drop LWJGL libraries carried over from the old bundled layout.
pub fn remove_lwjgl(file: &mut VersionFile) {
    file.libraries.retain(|lib| !lib.is_lwjgl());
}
