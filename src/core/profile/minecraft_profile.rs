// ─── Profile ───
// The ordered patch list of one instance and the launch configuration
// merged from it.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, warn};

use super::order::PatchOrder;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::version::{Jarmod, LibraryEntry, PatchPtr, VersionFile, MINECRAFT_UID};

/// Jar mods get orders above this so they land after loader patches.
const FIRST_FREE_ORDER: i32 = 100;

/// Effective launch configuration produced by merging every patch in order.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LaunchProfile {
    pub minecraft_version: Option<String>,
    pub main_class: Option<String>,
    pub applet_class: Option<String>,
    pub minecraft_arguments: Option<String>,
    pub release_type: Option<String>,
    pub release_time: Option<String>,
    pub assets: Option<String>,
    pub tweakers: Vec<String>,
    pub traits: BTreeSet<String>,
    pub libraries: Vec<LibraryEntry>,
    pub jar_mods: Vec<Jarmod>,
}

impl LaunchProfile {
    /// Apply one patch on top of everything merged so far.
    ///
    /// - Scalars: a patch that sets a value overrides earlier ones.
    /// - Tweakers: appended once each, keeping first position.
    /// - Traits: union.
    /// - Libraries: same `group:artifact[:classifier]` replaces in place,
    ///   anything else is appended.
    /// - Jar mods: appended.
    fn apply(&mut self, patch: &VersionFile) {
        if patch.is_base_game() && !patch.version.is_empty() {
            self.minecraft_version = Some(patch.version.clone());
        }

        override_with(&mut self.main_class, &patch.main_class);
        override_with(&mut self.applet_class, &patch.applet_class);
        override_with(&mut self.minecraft_arguments, &patch.minecraft_arguments);
        override_with(&mut self.release_type, &patch.release_type);
        override_with(&mut self.release_time, &patch.release_time);
        override_with(&mut self.assets, &patch.assets);

        for tweaker in &patch.tweakers {
            if !self.tweakers.contains(tweaker) {
                self.tweakers.push(tweaker.clone());
            }
        }

        self.traits.extend(patch.traits.iter().cloned());

        for lib in &patch.libraries {
            let prefix = lib.artifact_prefix();
            match self
                .libraries
                .iter_mut()
                .find(|existing| existing.artifact_prefix() == prefix)
            {
                Some(existing) => *existing = lib.clone(),
                None => self.libraries.push(lib.clone()),
            }
        }

        self.jar_mods.extend(patch.jar_mods.iter().cloned());
    }

    /// Libraries that pass their OS rules on this machine.
    pub fn active_libraries(&self) -> impl Iterator<Item = &LibraryEntry> {
        self.libraries
            .iter()
            .filter(|lib| lib.is_allowed_for_current_os())
    }

    pub fn has_trait(&self, name: &str) -> bool {
        self.traits.contains(name)
    }
}

fn override_with(target: &mut Option<String>, value: &Option<String>) {
    if let Some(v) = value {
        *target = Some(v.clone());
    }
}

/// Ordered patches of one instance.
///
/// Patches are shared handles: callers may keep a [`PatchPtr`] after the
/// profile dropped it. Any structural change discards the merged
/// [`LaunchProfile`] until [`Profile::finalize`] runs again.
#[derive(Debug, Default)]
pub struct Profile {
    patches: Vec<PatchPtr>,
    launch: Option<LaunchProfile>,
}

impl Profile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear_patches(&mut self) {
        self.patches.clear();
        self.launch = None;
    }

    /// Append a patch. Fails if a patch with the same `fileId` is present.
    pub fn append_patch(&mut self, patch: PatchPtr) -> LauncherResult<()> {
        if self.index_of(&patch.file_id).is_some() {
            return Err(LauncherError::DuplicatePatch(patch.file_id.clone()));
        }
        self.patches.push(patch);
        self.launch = None;
        Ok(())
    }

    pub fn remove(&mut self, file_id: &str) -> Option<PatchPtr> {
        let index = self.index_of(file_id)?;
        self.launch = None;
        Some(self.patches.remove(index))
    }

    /// Swap two positions. Both patches must be movable.
    pub fn swap(&mut self, a: usize, b: usize) -> LauncherResult<()> {
        for index in [a, b] {
            let patch = self
                .patches
                .get(index)
                .ok_or_else(|| LauncherError::PatchNotFound(format!("#{}", index)))?;
            if !patch.is_movable() {
                return Err(LauncherError::PatchNotMovable(patch.file_id.clone()));
            }
        }
        self.patches.swap(a, b);
        self.launch = None;
        Ok(())
    }

    pub fn patches(&self) -> &[PatchPtr] {
        &self.patches
    }

    pub fn patch(&self, file_id: &str) -> Option<&PatchPtr> {
        self.patches.iter().find(|p| p.file_id == file_id)
    }

    pub fn index_of(&self, file_id: &str) -> Option<usize> {
        self.patches.iter().position(|p| p.file_id == file_id)
    }

    pub fn patch_ids(&self) -> Vec<String> {
        self.patches.iter().map(|p| p.file_id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.patches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    /// Next intrinsic order above every existing patch (and above 100).
    /// `None` once some patch already holds `i32::MAX`.
    pub fn free_order_number(&self) -> Option<i32> {
        let largest = self
            .patches
            .iter()
            .map(|p| p.order)
            .fold(FIRST_FREE_ORDER, i32::max);
        largest.checked_add(1)
    }

    /// The order worth persisting: movable patches as they currently sit.
    pub fn current_order(&self) -> PatchOrder {
        self.patches
            .iter()
            .filter(|p| p.is_movable())
            .map(|p| p.file_id.clone())
            .collect()
    }

    /// Merge all patches in order into the launch configuration.
    ///
    /// Returns `VersionIncomplete` when the base game patch or a main class
    /// is missing; the patch list itself stays as loaded.
    pub fn finalize(&mut self) -> LauncherResult<&LaunchProfile> {
        self.launch = None;

        if self.patch(MINECRAFT_UID).is_none() {
            return Err(LauncherError::VersionIncomplete(MINECRAFT_UID.to_string()));
        }

        let mut merged = LaunchProfile::default();
        for patch in &self.patches {
            merged.apply(patch);
        }

        if merged.main_class.is_none() {
            return Err(LauncherError::VersionIncomplete("mainClass".to_string()));
        }

        debug!(
            "Finalized profile: {} patches, {} libraries, {} jar mods",
            self.patches.len(),
            merged.libraries.len(),
            merged.jar_mods.len()
        );
        Ok(&*self.launch.insert(merged))
    }

    /// Finalize, logging instead of failing. Returns whether it worked.
    pub fn reapply_safe(&mut self) -> bool {
        match self.finalize() {
            Ok(_) => true,
            Err(e) => {
                warn!("Couldn't apply profile patches: {}", e);
                false
            }
        }
    }

    /// The merged configuration, if the current patch list is finalized.
    pub fn launch_profile(&self) -> Option<&LaunchProfile> {
        self.launch.as_ref()
    }

    pub fn is_launchable(&self) -> bool {
        self.launch.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn patch(value: serde_json::Value) -> PatchPtr {
        let mut file: VersionFile = serde_json::from_value(value).unwrap();
        file.set_mutable(true);
        Arc::new(file)
    }

    fn base_game() -> PatchPtr {
        patch(serde_json::json!({
            "fileId": "net.minecraft",
            "version": "1.7.10",
            "order": -2,
            "mainClass": "net.minecraft.client.main.Main",
            "minecraftArguments": "--username ${auth_player_name}",
            "assets": "1.7.10",
            "libraries": [
                {"name": "net.minecraft:launchwrapper:1.5"},
                {"name": "com.google.guava:guava:15.0"}
            ]
        }))
    }

    fn forge() -> PatchPtr {
        patch(serde_json::json!({
            "fileId": "net.minecraftforge",
            "version": "10.13.4.1614",
            "order": 5,
            "mainClass": "net.minecraft.launchwrapper.Launch",
            "+tweakers": ["cpw.mods.fml.common.launcher.FMLTweaker"],
            "+traits": ["FirstThreadOnMacOS"],
            "libraries": [
                {"name": "net.minecraft:launchwrapper:1.12"},
                {"name": "net.minecraftforge:forge:1.7.10-10.13.4.1614"}
            ]
        }))
    }

    #[test]
    fn append_rejects_duplicate_ids() {
        let mut profile = Profile::new();
        profile.append_patch(base_game()).unwrap();
        let err = profile.append_patch(base_game()).unwrap_err();
        assert!(matches!(err, LauncherError::DuplicatePatch(id) if id == "net.minecraft"));
        assert_eq!(profile.len(), 1);
    }

    #[test]
    fn finalize_merges_in_order() {
        let mut profile = Profile::new();
        profile.append_patch(base_game()).unwrap();
        profile.append_patch(forge()).unwrap();

        let launch = profile.finalize().unwrap().clone();

        assert_eq!(launch.minecraft_version.as_deref(), Some("1.7.10"));
        assert_eq!(
            launch.main_class.as_deref(),
            Some("net.minecraft.launchwrapper.Launch")
        );
        assert_eq!(launch.assets.as_deref(), Some("1.7.10"));
        assert_eq!(launch.tweakers, vec!["cpw.mods.fml.common.launcher.FMLTweaker"]);
        assert!(launch.has_trait("FirstThreadOnMacOS"));

        let libs: Vec<_> = launch.libraries.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(
            libs,
            vec![
                "net.minecraft:launchwrapper:1.12",
                "com.google.guava:guava:15.0",
                "net.minecraftforge:forge:1.7.10-10.13.4.1614",
            ]
        );
        assert!(profile.is_launchable());
    }

    #[test]
    fn finalize_without_base_game_is_incomplete() {
        let mut profile = Profile::new();
        profile.append_patch(forge()).unwrap();

        let err = profile.finalize().unwrap_err();
        assert!(err.is_version_incomplete());
        assert!(!profile.is_launchable());
        assert!(!profile.reapply_safe());
        assert_eq!(profile.len(), 1);
    }

    #[test]
    fn structural_change_invalidates_merge() {
        let mut profile = Profile::new();
        profile.append_patch(base_game()).unwrap();
        profile.finalize().unwrap();
        assert!(profile.is_launchable());

        profile.append_patch(forge()).unwrap();
        assert!(profile.launch_profile().is_none());

        profile.finalize().unwrap();
        profile.remove("net.minecraftforge").unwrap();
        assert!(profile.launch_profile().is_none());
    }

    #[test]
    fn free_order_number_starts_above_hundred() {
        let mut profile = Profile::new();
        assert_eq!(profile.free_order_number(), Some(101));

        profile.append_patch(base_game()).unwrap();
        profile
            .append_patch(patch(serde_json::json!({"fileId": "jar", "order": 140})))
            .unwrap();
        assert_eq!(profile.free_order_number(), Some(141));
    }

    #[test]
    fn free_order_number_exhausted_at_max() {
        let mut profile = Profile::new();
        profile
            .append_patch(patch(serde_json::json!({"fileId": "last", "order": i32::MAX})))
            .unwrap();
        assert_eq!(profile.free_order_number(), None);
    }

    #[test]
    fn swap_refuses_pinned_patches() {
        let mut profile = Profile::new();
        profile.append_patch(base_game()).unwrap();
        profile.append_patch(forge()).unwrap();
        profile
            .append_patch(patch(serde_json::json!({"fileId": "jar", "order": 101})))
            .unwrap();

        let err = profile.swap(0, 1).unwrap_err();
        assert!(matches!(err, LauncherError::PatchNotMovable(id) if id == "net.minecraft"));

        profile.swap(1, 2).unwrap();
        assert_eq!(profile.patch_ids(), vec!["net.minecraft", "jar", "net.minecraftforge"]);
        assert_eq!(profile.current_order(), vec!["jar", "net.minecraftforge"]);
    }

    #[test]
    fn handles_outlive_removal() {
        let mut profile = Profile::new();
        let handle = forge();
        profile.append_patch(handle.clone()).unwrap();

        let removed = profile.remove("net.minecraftforge").unwrap();
        assert!(Arc::ptr_eq(&removed, &handle));
        assert_eq!(handle.version, "10.13.4.1614");
        assert!(profile.is_empty());
    }
}
