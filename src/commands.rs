// ─── Commands ───
// Front-end facing surface. Every command locks the shared state, does its
// work through the instance's `ProfileStrategy` and answers with serde DTOs.
// Errors serialize as their display string.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::instance::Instance;
use crate::core::loaders::{create_install_task, ForgeInstaller, LoaderVersion};
use crate::core::profile::{MoveDirection, ProfileStrategy};
use crate::core::state::AppState;
use crate::core::version::PatchPtr;

pub type SharedState = Arc<Mutex<AppState>>;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceInfo {
    pub id: String,
    pub name: String,
    pub path: String,
    pub minecraft_version: Option<String>,
    pub created_at: String,
    pub last_played: Option<String>,
}

impl From<&Instance> for InstanceInfo {
    fn from(inst: &Instance) -> Self {
        Self {
            id: inst.id.clone(),
            name: inst.name.clone(),
            path: inst.path.to_string_lossy().to_string(),
            minecraft_version: inst.minecraft_version.clone(),
            created_at: inst.created_at.to_rfc3339(),
            last_played: inst.last_played.map(|date| date.to_rfc3339()),
        }
    }
}

/// One row of the patch list shown to the user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchSummary {
    pub uid: String,
    pub name: String,
    pub version: String,
    pub order: i32,
    pub custom: bool,
    pub removable: bool,
    pub movable: bool,
    pub jar_mods: usize,
}

impl From<&PatchPtr> for PatchSummary {
    fn from(patch: &PatchPtr) -> Self {
        Self {
            uid: patch.file_id.clone(),
            name: patch.name.clone(),
            version: patch.version.clone(),
            order: patch.order,
            custom: patch.is_custom(),
            removable: patch.is_removable(),
            movable: patch.is_movable(),
            jar_mods: patch.jar_mods.len(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    pub instance_id: String,
    pub patches: Vec<PatchSummary>,
    pub launchable: bool,
    pub minecraft_version: Option<String>,
    pub main_class: Option<String>,
    /// Libraries that pass their OS rules on this machine.
    pub libraries: Vec<String>,
    pub traits: Vec<String>,
}

impl ProfileSummary {
    fn of(strategy: &ProfileStrategy) -> Self {
        let profile = strategy.profile();
        let launch = profile.launch_profile();
        Self {
            instance_id: strategy.instance().id.clone(),
            patches: profile.patches().iter().map(PatchSummary::from).collect(),
            launchable: profile.is_launchable(),
            minecraft_version: launch.and_then(|l| l.minecraft_version.clone()),
            main_class: launch.and_then(|l| l.main_class.clone()),
            libraries: launch
                .map(|l| l.active_libraries().map(|lib| lib.name.clone()).collect())
                .unwrap_or_default(),
            traits: launch
                .map(|l| l.traits.iter().cloned().collect())
                .unwrap_or_default(),
        }
    }
}

fn find_patch(strategy: &ProfileStrategy, uid: &str) -> LauncherResult<PatchPtr> {
    strategy
        .profile()
        .patch(uid)
        .cloned()
        .ok_or_else(|| LauncherError::PatchNotFound(uid.to_string()))
}

// ── Instances ───────────────────────────────────────────

pub async fn create_instance(
    state: &SharedState,
    name: String,
    minecraft_version: Option<String>,
) -> Result<InstanceInfo, LauncherError> {
    let state = state.lock().await;
    let instance = Instance::new(name, minecraft_version, &state.instances_dir());
    let instance = state.instance_manager.create(instance).await?;
    info!("Instance '{}' created", instance.name);
    Ok(InstanceInfo::from(&instance))
}

pub async fn list_instances(state: &SharedState) -> Result<Vec<InstanceInfo>, LauncherError> {
    let state = state.lock().await;
    let instances = state.instance_manager.list().await?;
    Ok(instances.iter().map(InstanceInfo::from).collect())
}

pub async fn delete_instance(state: &SharedState, id: String) -> Result<(), LauncherError> {
    let mut state = state.lock().await;
    state.close_profile(&id);
    state.instance_manager.delete(&id).await?;
    info!("Deleted instance {}", id);
    Ok(())
}

// ── Profile ─────────────────────────────────────────────

pub async fn get_profile(
    state: &SharedState,
    instance_id: String,
) -> Result<ProfileSummary, LauncherError> {
    let mut state = state.lock().await;
    let strategy = state.open_profile(&instance_id).await?;
    Ok(ProfileSummary::of(strategy))
}

/// Throw away the cached profile and read it again from disk.
pub async fn reload_profile(
    state: &SharedState,
    instance_id: String,
) -> Result<ProfileSummary, LauncherError> {
    let mut state = state.lock().await;
    state.close_profile(&instance_id);
    let strategy = state.open_profile(&instance_id).await?;
    Ok(ProfileSummary::of(strategy))
}

pub async fn move_patch(
    state: &SharedState,
    instance_id: String,
    index: usize,
    direction: MoveDirection,
) -> Result<ProfileSummary, LauncherError> {
    let mut state = state.lock().await;
    let strategy = state.open_profile(&instance_id).await?;
    strategy.move_patch(index, direction)?;
    Ok(ProfileSummary::of(strategy))
}

pub async fn reset_order(
    state: &SharedState,
    instance_id: String,
) -> Result<ProfileSummary, LauncherError> {
    let mut state = state.lock().await;
    let strategy = state.open_profile(&instance_id).await?;
    strategy.reset_order()?;
    if let Err(e) = strategy.load() {
        if !e.is_version_incomplete() {
            return Err(e);
        }
        warn!("Profile of {} is incomplete: {}", instance_id, e);
    }
    Ok(ProfileSummary::of(strategy))
}

pub async fn remove_patch(
    state: &SharedState,
    instance_id: String,
    uid: String,
) -> Result<ProfileSummary, LauncherError> {
    let mut state = state.lock().await;
    let strategy = state.open_profile(&instance_id).await?;
    let patch = find_patch(strategy, &uid)?;
    strategy.remove_patch(&patch)?;
    Ok(ProfileSummary::of(strategy))
}

pub async fn customize_patch(
    state: &SharedState,
    instance_id: String,
    uid: String,
) -> Result<ProfileSummary, LauncherError> {
    let mut state = state.lock().await;
    let strategy = state.open_profile(&instance_id).await?;
    let patch = find_patch(strategy, &uid)?;
    strategy.customize_patch(&patch)?;
    Ok(ProfileSummary::of(strategy))
}

pub async fn revert_patch(
    state: &SharedState,
    instance_id: String,
    uid: String,
) -> Result<ProfileSummary, LauncherError> {
    let mut state = state.lock().await;
    let strategy = state.open_profile(&instance_id).await?;
    let patch = find_patch(strategy, &uid)?;
    strategy.revert_patch(&patch)?;
    Ok(ProfileSummary::of(strategy))
}

pub async fn install_jar_mods(
    state: &SharedState,
    instance_id: String,
    files: Vec<PathBuf>,
) -> Result<ProfileSummary, LauncherError> {
    let mut state = state.lock().await;
    let strategy = state.open_profile(&instance_id).await?;
    strategy.install_jar_mods(&files)?;
    Ok(ProfileSummary::of(strategy))
}

/// Install Forge from a local installer jar and reload the profile.
///
/// The state lock is released while the installer runs.
pub async fn install_forge(
    state: &SharedState,
    instance_id: String,
    loader_version: String,
    installer_path: PathBuf,
) -> Result<ProfileSummary, LauncherError> {
    let task = {
        let mut guard = state.lock().await;
        let libs_dir = guard.libraries_dir();
        let strategy = guard.open_profile(&instance_id).await?;
        let instance = strategy.instance().clone();
        let minecraft_version = instance
            .minecraft_version
            .clone()
            .ok_or_else(|| LauncherError::Loader(format!("{} has no game version", instance_id)))?;

        create_install_task(
            Arc::new(ForgeInstaller::new()),
            &instance,
            LoaderVersion {
                minecraft_version,
                loader_version,
                installer_path,
            },
            libs_dir,
        )
    };

    task.wait().await?;

    let mut state = state.lock().await;
    state.close_profile(&instance_id);
    let strategy = state.open_profile(&instance_id).await?;
    Ok(ProfileSummary::of(strategy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::version::version_file::current_os_name;
    use crate::core::version::{LocalVersionIndex, MINECRAFT_UID};
    use std::path::Path;
    use tempfile::TempDir;

    fn write_base_game(meta: &Path) {
        let dir = meta.join(MINECRAFT_UID);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("1.7.10.json"),
            serde_json::to_vec(&serde_json::json!({
                "fileId": MINECRAFT_UID,
                "name": "Minecraft",
                "version": "1.7.10",
                "order": -2,
                "mainClass": "net.minecraft.client.main.Main",
                "libraries": [
                    { "name": "com.google.guava:guava:15.0" },
                    {
                        "name": "com.example:elsewhere-only:1.0",
                        "rules": [
                            { "action": "allow" },
                            { "action": "disallow", "os": { "name": current_os_name() } }
                        ]
                    }
                ]
            }))
            .unwrap(),
        )
        .unwrap();
    }

    async fn setup() -> (TempDir, SharedState, String) {
        let dir = TempDir::new().unwrap();
        let meta = dir.path().join("meta");
        write_base_game(&meta);
        let state = AppState::new(dir.path().join("data"))
            .with_version_index(Arc::new(LocalVersionIndex::new(meta)));
        let state: SharedState = Arc::new(Mutex::new(state));

        let info = create_instance(&state, "Test".into(), Some("1.7.10".into()))
            .await
            .unwrap();
        (dir, state, info.id)
    }

    async fn instance(state: &SharedState, id: &str) -> Instance {
        state.lock().await.instance_manager.load(id).await.unwrap()
    }

    fn write_patch(instance: &Instance, id: &str, order: i32) {
        std::fs::write(
            instance.patch_path(id),
            serde_json::to_vec(&serde_json::json!({
                "fileId": id,
                "name": id,
                "version": "1.0",
                "order": order
            }))
            .unwrap(),
        )
        .unwrap();
    }

    fn uids(summary: &ProfileSummary) -> Vec<&str> {
        summary.patches.iter().map(|p| p.uid.as_str()).collect()
    }

    #[tokio::test]
    async fn fresh_instance_uses_pristine_base_game() {
        let (_dir, state, id) = setup().await;

        let summary = get_profile(&state, id).await.unwrap();

        assert_eq!(uids(&summary), vec![MINECRAFT_UID]);
        assert!(summary.launchable);
        assert!(!summary.patches[0].custom);
        assert!(!summary.patches[0].removable);
        assert_eq!(summary.minecraft_version.as_deref(), Some("1.7.10"));
        assert_eq!(summary.libraries, vec!["com.google.guava:guava:15.0"]);
    }

    #[tokio::test]
    async fn customize_and_revert_base_game() {
        let (_dir, state, id) = setup().await;
        let inst = instance(&state, &id).await;

        let summary = customize_patch(&state, id.clone(), MINECRAFT_UID.into())
            .await
            .unwrap();
        assert!(summary.patches[0].custom);
        assert!(inst.patch_path(MINECRAFT_UID).exists());

        let summary = revert_patch(&state, id, MINECRAFT_UID.into())
            .await
            .unwrap();
        assert!(!summary.patches[0].custom);
        assert!(!inst.patch_path(MINECRAFT_UID).exists());
    }

    #[tokio::test]
    async fn move_and_reset_order() {
        let (_dir, state, id) = setup().await;
        let inst = instance(&state, &id).await;
        write_patch(&inst, "a", 10);
        write_patch(&inst, "b", 20);

        let summary = reload_profile(&state, id.clone()).await.unwrap();
        assert_eq!(uids(&summary), vec![MINECRAFT_UID, "a", "b"]);

        let summary = move_patch(&state, id.clone(), 2, MoveDirection::Up)
            .await
            .unwrap();
        assert_eq!(uids(&summary), vec![MINECRAFT_UID, "b", "a"]);

        let summary = reset_order(&state, id).await.unwrap();
        assert_eq!(uids(&summary), vec![MINECRAFT_UID, "a", "b"]);
    }

    #[tokio::test]
    async fn remove_unknown_patch_is_reported() {
        let (_dir, state, id) = setup().await;

        let err = remove_patch(&state, id, "missing".into()).await.unwrap_err();
        assert!(matches!(err, LauncherError::PatchNotFound(ref uid) if uid == "missing"));
    }

    #[tokio::test]
    async fn installed_jar_mods_can_be_removed() {
        let (dir, state, id) = setup().await;
        let source = dir.path().join("OptiFine.jar");
        std::fs::write(&source, b"jar").unwrap();

        let summary = install_jar_mods(&state, id.clone(), vec![source])
            .await
            .unwrap();
        let jar_mod = summary
            .patches
            .iter()
            .find(|p| p.jar_mods == 1)
            .cloned()
            .unwrap();
        assert_eq!(jar_mod.name, "OptiFine (jar mod)");

        let summary = remove_patch(&state, id, jar_mod.uid).await.unwrap();
        assert_eq!(uids(&summary), vec![MINECRAFT_UID]);
    }

    #[tokio::test]
    async fn deleted_instance_is_closed() {
        let (_dir, state, id) = setup().await;
        get_profile(&state, id.clone()).await.unwrap();

        delete_instance(&state, id.clone()).await.unwrap();

        assert!(!state.lock().await.is_open(&id));
        assert!(list_instances(&state).await.unwrap().is_empty());
    }
}
