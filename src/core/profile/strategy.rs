// ─── Profile Strategy ───
// Owns the profile of one instance: loads it from disk and applies the
// mutations (reorder, remove, customize, revert, jar mods) so that the
// patch files and the in-memory profile stay consistent.
//
// Callers serialize structural operations per instance; nothing here locks.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::loader::PatchLoader;
use super::minecraft_profile::Profile;
use super::order::{remove_override_orders, write_override_orders};
use super::upgrade::upgrade_deprecated_files;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::fs;
use crate::core::instance::Instance;
use crate::core::version::{save_patch, Jarmod, PatchPtr, VersionFile, VersionIndex};

/// Namespace of the synthetic patches that register jar mods.
pub const JARMOD_UID_PREFIX: &str = "org.interface.jarmod.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    Up,
    Down,
}

type IdSource = Box<dyn FnMut() -> Uuid + Send>;

pub struct ProfileStrategy {
    instance: Instance,
    index: Option<Arc<dyn VersionIndex>>,
    profile: Profile,
    upgrade_legacy: bool,
    jar_mod_ids: IdSource,
}

impl ProfileStrategy {
    pub fn new(instance: Instance, index: Option<Arc<dyn VersionIndex>>) -> Self {
        Self {
            instance,
            index,
            profile: Profile::new(),
            upgrade_legacy: true,
            jar_mod_ids: Box::new(Uuid::new_v4),
        }
    }

    /// Whether `load` converts `custom.json`/`version.json` first.
    pub fn with_legacy_upgrade(mut self, enabled: bool) -> Self {
        self.upgrade_legacy = enabled;
        self
    }

    /// Replace the generator of jar mod identifiers.
    pub fn with_jar_mod_ids(mut self, ids: impl FnMut() -> Uuid + Send + 'static) -> Self {
        self.jar_mod_ids = Box::new(ids);
        self
    }

    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    // ── Loading ─────────────────────────────────────────

    /// Rebuild the profile from disk and merge it.
    ///
    /// On a hard load error the profile is left empty. `VersionIncomplete`
    /// keeps the loaded patches but no merged launch configuration.
    pub fn load(&mut self) -> LauncherResult<()> {
        self.profile.clear_patches();

        if self.upgrade_legacy {
            upgrade_deprecated_files(&self.instance);
        }

        if let Err(e) = self.load_patches() {
            self.profile.clear_patches();
            return Err(e);
        }

        self.profile.finalize()?;
        Ok(())
    }

    fn load_patches(&mut self) -> LauncherResult<()> {
        let loader = PatchLoader::new(&self.instance, self.index.as_deref());
        for patch in loader.load()? {
            self.profile.append_patch(patch)?;
        }
        Ok(())
    }

    /// Reload after a mutation already hit the disk. An incomplete version
    /// is expected here and only logged; anything else is returned.
    fn reload_after_mutation(&mut self) -> LauncherResult<()> {
        match self.load() {
            Ok(()) => Ok(()),
            Err(e) if e.is_version_incomplete() => {
                debug!("Version was incomplete: {}", e);
                Ok(())
            }
            Err(e) => {
                warn!("Version could not be loaded: {}", e);
                Err(e)
            }
        }
    }

    // ── Order ───────────────────────────────────────────

    pub fn save_order(&self, order: &[String]) -> LauncherResult<()> {
        write_override_orders(&self.instance.order_path(), order)
    }

    pub fn reset_order(&self) -> LauncherResult<()> {
        remove_override_orders(&self.instance.order_path())?;
        Ok(())
    }

    /// Swap the patch at `index` with its neighbour, persist the resulting
    /// order and reload.
    pub fn move_patch(&mut self, index: usize, direction: MoveDirection) -> LauncherResult<()> {
        let target = match direction {
            MoveDirection::Up => index.checked_sub(1),
            MoveDirection::Down => index.checked_add(1).filter(|&t| t < self.profile.len()),
        }
        .ok_or_else(|| LauncherError::PatchNotFound(format!("#{} {:?}", index, direction)))?;

        self.profile.swap(index, target)?;
        self.save_order(&self.profile.current_order())?;
        self.reload_after_mutation()
    }

    // ── Mutations ───────────────────────────────────────

    /// Delete a patch together with the jar mods it registered.
    ///
    /// The patch file goes first; if that fails nothing else is touched.
    /// Jar mod files that are already gone count as removed.
    pub fn remove_patch(&mut self, patch: &PatchPtr) -> LauncherResult<()> {
        if !patch.is_removable() {
            return Err(LauncherError::PatchNotRemovable(patch.file_id.clone()));
        }

        if !patch.filename.as_os_str().is_empty() {
            if let Err(e) = fs::remove_file_if_exists(&patch.filename) {
                error!("File {:?} could not be removed: {}", patch.filename, e);
                return Err(e);
            }
        }

        let mut jar_mod_result = Ok(());
        for jar_mod in &patch.jar_mods {
            let path = self.instance.jar_mods_dir().join(&jar_mod.name);
            if let Err(e) = fs::remove_file_if_exists(&path) {
                error!("File {:?} could not be removed: {}", path, e);
                if jar_mod_result.is_ok() {
                    jar_mod_result = Err(e);
                }
            }
        }

        self.profile.remove(&patch.file_id);
        self.save_order(&self.profile.current_order())?;
        self.reload_after_mutation()?;

        info!("Removed patch {} from {}", patch.file_id, self.instance.name());
        jar_mod_result
    }

    /// Store a full copy of a pristine patch as the instance's own file.
    pub fn customize_patch(&mut self, patch: &PatchPtr) -> LauncherResult<()> {
        if patch.is_custom() {
            return Err(LauncherError::PatchAlreadyCustom(patch.file_id.clone()));
        }

        let path = self.instance.patch_path(&patch.file_id);
        fs::ensure_parent_dir(&path)?;
        save_patch(patch, &path)?;

        info!("Customized patch {} in {}", patch.file_id, self.instance.name());
        self.reload_after_mutation()
    }

    /// Drop the instance's own copy of a patch so the pristine one returns.
    pub fn revert_patch(&mut self, patch: &PatchPtr) -> LauncherResult<()> {
        if !patch.is_custom() {
            // already not custom
            return Ok(());
        }
        if !patch.filename.exists() {
            // already gone
            return Ok(());
        }

        let removed = std::fs::remove_file(&patch.filename)
            .map_err(|e| LauncherError::io(&patch.filename, e));
        let reloaded = self.reload_after_mutation();

        removed?;
        reloaded?;
        info!("Reverted patch {} in {}", patch.file_id, self.instance.name());
        Ok(())
    }

    /// Copy jar files into the instance and register each as its own patch.
    ///
    /// Stops at the first failure. Files handled before it stay installed;
    /// their patches are on disk and come back with the next load.
    pub fn install_jar_mods(&mut self, sources: &[PathBuf]) -> LauncherResult<()> {
        let patches_dir = self.instance.patches_dir();
        let jar_mods_dir = self.instance.jar_mods_dir();
        fs::ensure_dir(&patches_dir)?;
        fs::ensure_dir(&jar_mods_dir)?;

        let mut outcome = Ok(());
        for source in sources {
            let installed = self
                .install_jar_mod(source, &jar_mods_dir)
                .and_then(|patch| self.profile.append_patch(Arc::new(patch)));
            if let Err(e) = installed {
                outcome = Err(e);
                break;
            }
        }

        // Whatever made it in stays merged and ordered, even after a failure.
        let saved = self.save_order(&self.profile.current_order());
        self.profile.reapply_safe();
        outcome.and(saved)
    }

    fn install_jar_mod(&mut self, source: &Path, jar_mods_dir: &Path) -> LauncherResult<VersionFile> {
        let id = (self.jar_mod_ids)().to_string();
        let target_filename = format!("{}.jar", id);
        let target_id = format!("{}{}", JARMOD_UID_PREFIX, id);
        let base_name = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let final_path = jar_mods_dir.join(&target_filename);

        if final_path.exists() {
            return Err(LauncherError::JarModExists(final_path));
        }
        let order = self
            .profile
            .free_order_number()
            .ok_or(LauncherError::NoFreeOrder(i32::MAX))?;

        std::fs::copy(source, &final_path).map_err(|e| LauncherError::io(source, e))?;

        let mut file = VersionFile {
            file_id: target_id.clone(),
            name: format!("{} (jar mod)", base_name),
            order,
            jar_mods: vec![Jarmod {
                name: target_filename,
                original_name: base_name,
            }],
            filename: self.instance.patch_path(&target_id),
            custom: true,
            ..Default::default()
        };
        file.set_mutable(true);

        if let Err(e) = save_patch(&file, &file.filename) {
            error!("Error writing {:?}: {}", file.filename, e);
            return Err(e);
        }

        info!(
            "Installed jar mod {:?} as {} in {}",
            source,
            target_id,
            self.instance.name()
        );
        Ok(file)
    }
}
