use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Instance representation persisted to disk as `instance.json`.
///
/// Each instance has its own folder under `instances/<uuid>/` with:
/// - `patches/`: one `<fileId>.json` per version fragment
/// - `order.json`: user-chosen patch order
/// - `jarmods/`: jar mods copied in by the user
/// - `instance.json`: this serialized struct
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    pub id: String,
    pub name: String,
    pub path: PathBuf,
    /// Base game version the profile is built on. When set and no custom
    /// base game patch exists, the pristine patch comes from the version index.
    #[serde(default)]
    pub minecraft_version: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_played: Option<DateTime<Utc>>,
}

impl Instance {
    /// Create a new instance with a fresh id under `base_dir`.
    pub fn new(name: String, minecraft_version: Option<String>, base_dir: &Path) -> Self {
        let id = Uuid::new_v4().to_string();
        let path = base_dir.join(&id);

        Self {
            id,
            name,
            path,
            minecraft_version,
            created_at: Utc::now(),
            last_played: None,
        }
    }

    /// Wrap an existing instance directory.
    pub fn at(path: PathBuf, name: impl Into<String>) -> Self {
        let id = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            id,
            name: name.into(),
            path,
            minecraft_version: None,
            created_at: Utc::now(),
            last_played: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instance_root(&self) -> &Path {
        &self.path
    }

    /// Path to the `patches/` directory.
    pub fn patches_dir(&self) -> PathBuf {
        self.path.join("patches")
    }

    /// Canonical on-disk location of patch `file_id`.
    pub fn patch_path(&self, file_id: &str) -> PathBuf {
        self.patches_dir().join(format!("{}.json", file_id))
    }

    /// Path to the persisted user patch order.
    pub fn order_path(&self) -> PathBuf {
        self.path.join("order.json")
    }

    /// Path to the `jarmods/` directory.
    pub fn jar_mods_dir(&self) -> PathBuf {
        self.path.join("jarmods")
    }

    /// Path to this instance's config file.
    pub fn config_path(&self) -> PathBuf {
        self.path.join("instance.json")
    }
}
