use std::path::{Path, PathBuf};

use tracing::info;

use super::model::Instance;
use crate::core::error::{LauncherError, LauncherResult};

/// Manages the lifecycle of instances on disk.
pub struct InstanceManager {
    /// Root directory where all instances live.
    instances_dir: PathBuf,
}

impl InstanceManager {
    pub fn new(instances_dir: PathBuf) -> Self {
        Self { instances_dir }
    }

    pub fn instances_dir(&self) -> &Path {
        &self.instances_dir
    }

    /// Create a new instance on disk.
    ///
    /// Creates:
    /// - `<instance>/patches/`
    /// - `<instance>/jarmods/`
    /// - `<instance>/instance.json`
    pub async fn create(&self, mut instance: Instance) -> LauncherResult<Instance> {
        instance.path = self.instances_dir.join(&instance.id);

        if instance.path.exists() {
            return Err(LauncherError::InstanceAlreadyExists(instance.id.clone()));
        }

        let patches_dir = instance.patches_dir();
        let jar_mods_dir = instance.jar_mods_dir();
        tokio::try_join!(create_dir_safe(&patches_dir), create_dir_safe(&jar_mods_dir))?;

        self.save(&instance).await?;

        info!("Created instance '{}' ({})", instance.name, instance.id);
        Ok(instance)
    }

    /// Save instance metadata to disk.
    pub async fn save(&self, instance: &Instance) -> LauncherResult<()> {
        let json = serde_json::to_string_pretty(instance)?;
        let config_path = instance.config_path();

        if let Some(parent) = config_path.parent() {
            create_dir_safe(parent).await?;
        }

        tokio::fs::write(&config_path, json)
            .await
            .map_err(|e| LauncherError::io(config_path, e))?;

        Ok(())
    }

    /// Load a single instance by ID.
    pub async fn load(&self, id: &str) -> LauncherResult<Instance> {
        let config_path = self.instances_dir.join(id).join("instance.json");
        if !config_path.exists() {
            return Err(LauncherError::InstanceNotFound(id.to_string()));
        }

        let json = tokio::fs::read_to_string(&config_path)
            .await
            .map_err(|e| LauncherError::io(config_path.clone(), e))?;

        let mut instance: Instance = serde_json::from_str(&json)?;
        // The folder may have been moved together with the data directory.
        instance.path = self.instances_dir.join(id);
        Ok(instance)
    }

    /// List all instances. Unreadable `instance.json` files are skipped.
    pub async fn list(&self) -> LauncherResult<Vec<Instance>> {
        let mut instances = Vec::new();

        if !self.instances_dir.exists() {
            return Ok(instances);
        }

        let mut entries = tokio::fs::read_dir(&self.instances_dir)
            .await
            .map_err(|e| LauncherError::io(self.instances_dir.clone(), e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| LauncherError::io(self.instances_dir.clone(), e))?
        {
            let path = entry.path();
            let config_path = path.join("instance.json");
            if !config_path.exists() {
                continue;
            }
            match tokio::fs::read_to_string(&config_path).await {
                Ok(json) => match serde_json::from_str::<Instance>(&json) {
                    Ok(mut inst) => {
                        inst.path = path;
                        instances.push(inst);
                    }
                    Err(e) => {
                        tracing::warn!("Corrupt instance.json at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Cannot read {:?}: {}", config_path, e);
                }
            }
        }

        instances.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(instances)
    }

    /// Delete an instance from disk.
    pub async fn delete(&self, id: &str) -> LauncherResult<()> {
        let instance_dir = self.instances_dir.join(id);
        if !instance_dir.exists() {
            return Err(LauncherError::InstanceNotFound(id.to_string()));
        }

        tokio::fs::remove_dir_all(&instance_dir)
            .await
            .map_err(|e| LauncherError::io(instance_dir, e))?;

        info!("Deleted instance {}", id);
        Ok(())
    }
}

async fn create_dir_safe(path: &Path) -> LauncherResult<()> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|source| LauncherError::io(path, source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn create_builds_patch_layout() {
        let dir = TempDir::new().unwrap();
        let manager = InstanceManager::new(dir.path().to_path_buf());
        let instance = Instance::new("Alpha".into(), Some("1.7.10".into()), dir.path());

        let created = manager.create(instance).await.unwrap();

        assert!(created.patches_dir().is_dir());
        assert!(created.jar_mods_dir().is_dir());
        assert!(created.config_path().is_file());

        let loaded = manager.load(&created.id).await.unwrap();
        assert_eq!(loaded.name, "Alpha");
        assert_eq!(loaded.minecraft_version.as_deref(), Some("1.7.10"));
    }

    #[tokio::test]
    async fn create_refuses_existing_directory() {
        let dir = TempDir::new().unwrap();
        let manager = InstanceManager::new(dir.path().to_path_buf());
        let instance = Instance::new("Alpha".into(), None, dir.path());
        std::fs::create_dir_all(dir.path().join(&instance.id)).unwrap();

        let err = manager.create(instance).await.unwrap_err();
        assert!(matches!(err, LauncherError::InstanceAlreadyExists(_)));
    }

    #[tokio::test]
    async fn list_skips_corrupt_entries_and_delete_removes() {
        let dir = TempDir::new().unwrap();
        let manager = InstanceManager::new(dir.path().to_path_buf());
        let b = manager
            .create(Instance::new("Beta".into(), None, dir.path()))
            .await
            .unwrap();
        manager
            .create(Instance::new("Alpha".into(), None, dir.path()))
            .await
            .unwrap();
        let corrupt = dir.path().join("corrupt");
        std::fs::create_dir_all(&corrupt).unwrap();
        std::fs::write(corrupt.join("instance.json"), "{").unwrap();

        let names: Vec<_> = manager
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["Alpha", "Beta"]);

        manager.delete(&b.id).await.unwrap();
        assert!(matches!(
            manager.load(&b.id).await.unwrap_err(),
            LauncherError::InstanceNotFound(_)
        ));
    }
}
