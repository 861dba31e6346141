// ─── Patch Loader ───
// Reads every patch of an instance and puts them in load order:
//
//   1. the base game patch, pinned first (custom file, or pristine from the
//      version index when the instance names a game version);
//   2. patches listed in `order.json`, in listed sequence;
//   3. every other `patches/*.json`, ascending by intrinsic order.
//
// Id mismatches, duplicate ids and order collisions are hard errors that
// abort the load.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use super::order::{read_override_orders, PatchOrder};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::instance::Instance;
use crate::core::version::{parse_json_file, PatchPtr, VersionFile, VersionIndex, MINECRAFT_UID};

pub struct PatchLoader<'a> {
    instance: &'a Instance,
    index: Option<&'a dyn VersionIndex>,
}

impl<'a> PatchLoader<'a> {
    pub fn new(instance: &'a Instance, index: Option<&'a dyn VersionIndex>) -> Self {
        Self { instance, index }
    }

    pub fn load(&self) -> LauncherResult<Vec<PatchPtr>> {
        let user_order = read_override_orders(&self.instance.order_path());

        let ordered = self.load_user_ordered(&user_order)?;
        let consumed: HashSet<&str> = ordered.iter().map(|f| f.file_id.as_str()).collect();
        let sorted = self.load_remaining(&consumed)?;

        let mut patches: Vec<VersionFile> = ordered.into_iter().chain(sorted).collect();

        match patches.iter().position(VersionFile::is_base_game) {
            Some(0) => {}
            Some(pos) => {
                let base = patches.remove(pos);
                patches.insert(0, base);
            }
            None => {
                if let Some(base) = self.pristine_base_game()? {
                    patches.insert(0, base);
                }
            }
        }

        Ok(patches.into_iter().map(Arc::new).collect())
    }

    fn load_user_ordered(&self, user_order: &PatchOrder) -> LauncherResult<Vec<VersionFile>> {
        let mut loaded = Vec::with_capacity(user_order.len());

        for id in user_order {
            let path = self.instance.patch_path(id);
            if !path.exists() {
                debug!("Patch file {:?} was deleted by external means...", path);
                continue;
            }
            debug!("Reading {:?} by user order", path);

            let mut file = parse_json_file(&path, false)?;
            // Prevent tampering with files.
            if file.file_id != *id {
                return Err(LauncherError::PatchIdMismatch {
                    expected: id.clone(),
                    found: file.file_id,
                });
            }
            file.custom = true;
            file.set_mutable(true);
            loaded.push(file);
        }

        Ok(loaded)
    }

    fn load_remaining(&self, consumed: &HashSet<&str>) -> LauncherResult<Vec<VersionFile>> {
        let mut by_order: BTreeMap<i32, VersionFile> = BTreeMap::new();

        for path in json_files_in(&self.instance.patches_dir())? {
            debug!("Reading {:?}", path.file_name().unwrap_or_default());

            let mut file = parse_json_file(&path, true)?;
            if file.file_id.is_empty() {
                file.file_id = file_stem(&path);
            }
            // Already loaded in the first pass.
            if consumed.contains(file.file_id.as_str()) {
                continue;
            }
            if by_order.values().any(|other| other.file_id == file.file_id) {
                return Err(LauncherError::DuplicatePatch(file.file_id));
            }
            if let Some(existing) = by_order.get(&file.order) {
                return Err(LauncherError::DuplicatePatchOrder {
                    first: existing.file_id.clone(),
                    second: file.file_id,
                    order: file.order,
                });
            }
            file.custom = true;
            file.set_mutable(true);
            by_order.insert(file.order, file);
        }

        Ok(by_order.into_values().collect())
    }

    fn pristine_base_game(&self) -> LauncherResult<Option<VersionFile>> {
        let (Some(index), Some(version)) = (self.index, self.instance.minecraft_version.as_deref())
        else {
            return Ok(None);
        };

        match index.pristine_patch(MINECRAFT_UID, version)? {
            Some(mut file) => {
                file.custom = false;
                file.set_mutable(false);
                Ok(Some(file))
            }
            None => {
                warn!(
                    "No {} {} available for {}",
                    MINECRAFT_UID,
                    version,
                    self.instance.name()
                );
                Ok(None)
            }
        }
    }
}

/// `*.json` files directly inside `dir`, sorted by name. A missing
/// directory has no patches.
fn json_files_in(dir: &Path) -> LauncherResult<Vec<PathBuf>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(LauncherError::io(dir, e)),
    };

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| LauncherError::io(dir, e))?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
