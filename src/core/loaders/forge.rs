use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use super::context::InstallContext;
use super::installer::LoaderInstaller;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::fs;
use crate::core::maven::MavenArtifact;
use crate::core::version::{remove_lwjgl, LibraryEntry, VersionFile, MINECRAFT_UID};

pub const FORGE_UID: &str = "net.minecraftforge";
pub const FORGE_NAME: &str = "Forge";
/// Forge loads right after the base game.
pub const FORGE_ORDER: i32 = 5;

/// Turns a Forge installer jar into the `net.minecraftforge` patch.
///
/// Nothing from the installer is executed: the version description is read
/// straight out of the archive and, for legacy installers, the universal
/// jar is extracted into the libraries directory.
#[derive(Debug, Default, Clone, Copy)]
pub struct ForgeInstaller;

impl ForgeInstaller {
    pub fn new() -> Self {
        Self
    }
}

/// Subset of Forge's `install_profile.json`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ForgeInstallProfile {
    /// Legacy installers (up to 1.12) embed the version description here.
    #[serde(default)]
    version_info: Option<serde_json::Value>,
    #[serde(default)]
    install: Option<LegacyInstallSection>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyInstallSection {
    /// Maven coordinate of the universal jar.
    path: String,
    /// Name of the universal jar inside the installer.
    file_path: String,
}

#[async_trait::async_trait]
impl LoaderInstaller for ForgeInstaller {
    fn id(&self) -> &'static str {
        FORGE_UID
    }

    async fn install(&self, ctx: InstallContext) -> LauncherResult<VersionFile> {
        info!(
            "Installing Forge {} for MC {}",
            ctx.loader_version, ctx.minecraft_version
        );

        tokio::task::spawn_blocking(move || prepare(&ctx))
            .await
            .map_err(|e| LauncherError::Loader(format!("Forge installer task failed: {}", e)))?
    }
}

fn prepare(ctx: &InstallContext) -> LauncherResult<VersionFile> {
    let archive_file =
        File::open(&ctx.installer_path).map_err(|e| LauncherError::io(&ctx.installer_path, e))?;
    let mut archive = zip::ZipArchive::new(archive_file)?;

    let profile: Option<ForgeInstallProfile> = match archive.by_name("install_profile.json") {
        Ok(entry) => Some(serde_json::from_reader(entry)?),
        Err(zip::result::ZipError::FileNotFound) => None,
        Err(e) => return Err(e.into()),
    };

    let version_json = match profile {
        Some(ForgeInstallProfile {
            version_info: Some(version_info),
            install,
        }) => {
            if let Some(install) = install {
                extract_universal(&mut archive, &install, &ctx.libs_dir)?;
            }
            version_info
        }
        _ => {
            let entry = archive
                .by_name("version.json")
                .map_err(|e| LauncherError::Loader(format!("Missing version.json: {}", e)))?;
            serde_json::from_reader(entry)?
        }
    };

    let mut file: VersionFile = serde_json::from_value(version_json)?;
    into_forge_patch(&mut file, ctx);
    Ok(file)
}

fn extract_universal<R: Read + std::io::Seek>(
    archive: &mut zip::ZipArchive<R>,
    install: &LegacyInstallSection,
    libs_dir: &Path,
) -> LauncherResult<()> {
    let artifact = MavenArtifact::parse(&install.path)?;
    let target = libs_dir.join(artifact.local_path());

    let mut entry = archive.by_name(&install.file_path).map_err(|e| {
        LauncherError::Loader(format!("Missing {} in installer: {}", install.file_path, e))
    })?;
    let mut data = Vec::new();
    entry
        .read_to_end(&mut data)
        .map_err(|e| LauncherError::io(&target, e))?;

    fs::ensure_parent_dir(&target)?;
    fs::atomic_write(&target, &data)?;
    debug!("Extracted Forge universal jar to {:?}", target);
    Ok(())
}

/// Rewrite the installer's version description into a patch that layers on
/// top of the base game.
fn into_forge_patch(file: &mut VersionFile, ctx: &InstallContext) {
    file.file_id = FORGE_UID.to_string();
    file.name = FORGE_NAME.to_string();
    file.version = ctx.loader_version.clone();
    file.order = FORGE_ORDER;
    file.mc_version = Some(ctx.minecraft_version.clone());
    file.id = None;
    // The base game decides these.
    file.release_time = None;
    file.release_type = None;
    file.assets = None;

    if let Some(args) = file.minecraft_arguments.take() {
        let (rest, tweakers) = split_tweakers(&args);
        for tweaker in tweakers {
            if !file.tweakers.contains(&tweaker) {
                file.tweakers.push(tweaker);
            }
        }
        file.minecraft_arguments = (!rest.is_empty()).then_some(rest);
    }

    remove_lwjgl(file);
    file.libraries.retain(|lib| !is_game_jar(lib));
}

/// Legacy version descriptions list the game jar itself as a library.
fn is_game_jar(lib: &LibraryEntry) -> bool {
    lib.artifact().is_some_and(|a| {
        a.group_id == MINECRAFT_UID && matches!(a.artifact_id.as_str(), "client" | "minecraft")
    })
}

/// Pull every `--tweakClass <class>` pair out of a legacy argument string.
fn split_tweakers(args: &str) -> (String, Vec<String>) {
    let mut rest = Vec::new();
    let mut tweakers = Vec::new();
    let mut tokens = args.split_whitespace();

    while let Some(token) = tokens.next() {
        if token == "--tweakClass" {
            if let Some(class) = tokens.next() {
                tweakers.push(class.to_string());
            }
        } else {
            rest.push(token);
        }
    }

    (rest.join(" "), tweakers)
}
