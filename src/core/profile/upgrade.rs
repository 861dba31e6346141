// ─── Legacy Layout Upgrade ───
// Older instances describe their whole version in a single `custom.json`
// or `version.json` at the instance root. This turns that file into the
// base game patch `patches/net.minecraft.json`.
//
// Each step below is a named failure point. A failed step stops the
// upgrade, leaves whatever it already did in place, and is only logged:
// loading continues with the patches that exist.

use std::fmt;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::core::error::LauncherError;
use crate::core::fs;
use crate::core::instance::Instance;
use crate::core::version::{
    parse_json_file, remove_lwjgl, save_patch, MINECRAFT_NAME, MINECRAFT_ORDER, MINECRAFT_UID,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpgradeStep {
    CreatePatchDir,
    RenameSuperseded,
    ReadLegacy,
    WritePatch,
    RenameSource,
}

impl fmt::Display for UpgradeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            UpgradeStep::CreatePatchDir => "create patches folder",
            UpgradeStep::RenameSuperseded => "rename superseded version.json",
            UpgradeStep::ReadLegacy => "read legacy version file",
            UpgradeStep::WritePatch => "save main patch",
            UpgradeStep::RenameSource => "rename legacy version file",
        };
        f.write_str(text)
    }
}

#[derive(Debug)]
pub struct UpgradeFailure {
    pub step: UpgradeStep,
    pub error: LauncherError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpgradeOutcome {
    /// No legacy file present.
    NothingToDo,
    /// The base game patch already exists; legacy files are left alone.
    AlreadyMigrated,
    /// `source` was converted and renamed to `<source>.old`.
    Migrated { source: PathBuf },
}

/// Run the upgrade, logging instead of returning any failure.
pub fn upgrade_deprecated_files(instance: &Instance) -> Option<UpgradeOutcome> {
    match try_upgrade(instance) {
        Ok(outcome) => {
            if let UpgradeOutcome::Migrated { source } = &outcome {
                info!(
                    "Upgraded {:?} to the patch layout in {}",
                    source,
                    instance.name()
                );
            }
            Some(outcome)
        }
        Err(failure) => {
            warn!(
                "Couldn't {} in {}: {}",
                failure.step,
                instance.name(),
                failure.error
            );
            None
        }
    }
}

pub fn try_upgrade(instance: &Instance) -> Result<UpgradeOutcome, UpgradeFailure> {
    let root = instance.instance_root();
    let version_json = root.join("version.json");
    let custom_json = root.join("custom.json");
    let mc_json = instance.patch_path(MINECRAFT_UID);

    // custom.json wins; a version.json next to it is superseded.
    let (source, superseded) = if custom_json.exists() {
        (custom_json, Some(version_json))
    } else if version_json.exists() {
        (version_json, None)
    } else {
        return Ok(UpgradeOutcome::NothingToDo);
    };

    if mc_json.exists() {
        return Ok(UpgradeOutcome::AlreadyMigrated);
    }

    fs::ensure_parent_dir(&mc_json).map_err(at(UpgradeStep::CreatePatchDir))?;

    if let Some(superseded) = superseded.filter(|p| p.exists()) {
        fs::rename_to_old(&superseded).map_err(at(UpgradeStep::RenameSuperseded))?;
    }

    let mut file = parse_json_file(&source, false).map_err(at(UpgradeStep::ReadLegacy))?;
    remove_lwjgl(&mut file);
    file.file_id = MINECRAFT_UID.to_string();
    file.version = file.id.clone().unwrap_or_default();
    file.name = MINECRAFT_NAME.to_string();
    file.order = MINECRAFT_ORDER;

    save_patch(&file, &mc_json).map_err(at(UpgradeStep::WritePatch))?;

    fs::rename_to_old(&source).map_err(at(UpgradeStep::RenameSource))?;

    Ok(UpgradeOutcome::Migrated { source })
}

fn at(step: UpgradeStep) -> impl FnOnce(LauncherError) -> UpgradeFailure {
    move |error| UpgradeFailure { step, error }
}
