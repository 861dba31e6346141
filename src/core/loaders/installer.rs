use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::context::InstallContext;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::fs;
use crate::core::instance::Instance;
use crate::core::version::{save_patch, VersionFile};

/// Loader version picked by the user, with its installer already fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderVersion {
    pub minecraft_version: String,
    pub loader_version: String,
    pub installer_path: PathBuf,
}

/// A mod loader that turns its installer into one profile patch.
#[async_trait]
pub trait LoaderInstaller: Send + Sync {
    /// `fileId` of the patch this installer produces.
    fn id(&self) -> &'static str;

    async fn install(&self, ctx: InstallContext) -> LauncherResult<VersionFile>;
}

/// Handle to a running installation.
///
/// The profile is not told when it finishes; callers reload the profile
/// once the patch file exists.
pub struct InstallTask {
    uid: &'static str,
    handle: JoinHandle<LauncherResult<PathBuf>>,
}

impl InstallTask {
    pub fn uid(&self) -> &str {
        self.uid
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn abort(&self) {
        self.handle.abort();
    }

    /// Wait for the task; yields the path of the written patch.
    pub async fn wait(self) -> LauncherResult<PathBuf> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(LauncherError::Loader(format!(
                "Installation of {} was cancelled",
                self.uid
            ))),
            Err(e) => Err(LauncherError::Loader(format!(
                "Installation of {} failed: {}",
                self.uid, e
            ))),
        }
    }
}

/// Spawn `installer` on the tokio runtime. On success the produced patch is
/// written atomically to `patches/<uid>.json` of `instance`.
///
/// Must be called from within a tokio runtime.
pub fn create_install_task(
    installer: Arc<dyn LoaderInstaller>,
    instance: &Instance,
    version: LoaderVersion,
    libs_dir: PathBuf,
) -> InstallTask {
    let uid = installer.id();
    let patch_path = instance.patch_path(uid);
    let instance_name = instance.name().to_string();
    let ctx = InstallContext {
        minecraft_version: version.minecraft_version,
        loader_version: version.loader_version,
        installer_path: version.installer_path,
        libs_dir,
    };

    let handle = tokio::spawn(async move {
        let mut file = match installer.install(ctx).await {
            Ok(file) => file,
            Err(e) => {
                warn!("Installing {} into {} failed: {}", uid, instance_name, e);
                return Err(e);
            }
        };
        file.file_id = uid.to_string();

        let target = patch_path.clone();
        tokio::task::spawn_blocking(move || {
            fs::ensure_parent_dir(&target)?;
            save_patch(&file, &target)
        })
        .await
        .map_err(|e| LauncherError::Loader(format!("Writing {} patch failed: {}", uid, e)))??;

        info!("Installed {} into {}", uid, instance_name);
        Ok(patch_path)
    });

    InstallTask { uid, handle }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::version::parse_json_file;
    use tempfile::TempDir;

    struct StaticInstaller;

    #[async_trait]
    impl LoaderInstaller for StaticInstaller {
        fn id(&self) -> &'static str {
            "com.example.loader"
        }

        async fn install(&self, ctx: InstallContext) -> LauncherResult<VersionFile> {
            Ok(VersionFile {
                name: "Example".into(),
                version: ctx.loader_version,
                order: 7,
                ..Default::default()
            })
        }
    }

    struct FailingInstaller;

    #[async_trait]
    impl LoaderInstaller for FailingInstaller {
        fn id(&self) -> &'static str {
            "com.example.broken"
        }

        async fn install(&self, _ctx: InstallContext) -> LauncherResult<VersionFile> {
            Err(LauncherError::Loader("no installer".into()))
        }
    }

    fn version(dir: &TempDir) -> LoaderVersion {
        LoaderVersion {
            minecraft_version: "1.7.10".into(),
            loader_version: "2.0".into(),
            installer_path: dir.path().join("installer.jar"),
        }
    }

    #[tokio::test]
    async fn task_writes_patch_under_installer_id() {
        let dir = TempDir::new().unwrap();
        let instance = Instance::at(dir.path().join("inst"), "task");

        let task = create_install_task(
            Arc::new(StaticInstaller),
            &instance,
            version(&dir),
            dir.path().join("libraries"),
        );
        assert_eq!(task.uid(), "com.example.loader");
        let path = task.wait().await.unwrap();

        assert_eq!(path, instance.patch_path("com.example.loader"));
        let patch = parse_json_file(&path, true).unwrap();
        assert_eq!(patch.file_id, "com.example.loader");
        assert_eq!(patch.version, "2.0");
    }

    #[tokio::test]
    async fn failed_install_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let instance = Instance::at(dir.path().join("inst"), "task");

        let task = create_install_task(
            Arc::new(FailingInstaller),
            &instance,
            version(&dir),
            dir.path().join("libraries"),
        );
        let err = task.wait().await.unwrap_err();

        assert!(matches!(err, LauncherError::Loader(_)));
        assert!(!instance.patch_path("com.example.broken").exists());
    }
}
