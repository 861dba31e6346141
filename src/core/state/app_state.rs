use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::fs;
use crate::core::instance::InstanceManager;
use crate::core::profile::ProfileStrategy;
use crate::core::version::{LocalVersionIndex, VersionIndex};

const APP_DIR_NAME: &str = "InterfaceOficial";
const BOOTSTRAP_FILE: &str = "launcher_bootstrap.json";
const SETTINGS_FILE: &str = "launcher_settings.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherSettings {
    /// Migrate single-file instances to the patch layout when they are opened.
    pub upgrade_legacy_files: bool,
    /// Local version index cache; `<data>/meta` when unset.
    pub meta_dir: Option<PathBuf>,
    /// Tracing filter used when `RUST_LOG` is not set.
    pub log_filter: Option<String>,
}

impl Default for LauncherSettings {
    fn default() -> Self {
        Self {
            upgrade_legacy_files: true,
            meta_dir: None,
            log_filter: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct BootstrapConfig {
    data_dir: PathBuf,
}

pub struct AppState {
    pub data_dir: PathBuf,
    pub instance_manager: InstanceManager,
    pub launcher_settings: LauncherSettings,
    pub version_index: Arc<dyn VersionIndex>,
    /// One strategy per opened instance; each owns its profile exclusively.
    profiles: HashMap<String, ProfileStrategy>,
}

impl AppState {
    pub fn new(data_dir: PathBuf) -> Self {
        let launcher_settings = load_settings_from_disk(&data_dir).unwrap_or_default();
        let meta_dir = launcher_settings
            .meta_dir
            .clone()
            .unwrap_or_else(|| data_dir.join("meta"));

        Self {
            instance_manager: InstanceManager::new(data_dir.join("instances")),
            version_index: Arc::new(LocalVersionIndex::new(meta_dir)),
            launcher_settings,
            profiles: HashMap::new(),
            data_dir,
        }
    }

    /// State rooted at the platform data directory (or wherever the
    /// bootstrap file points), with logging installed from its settings.
    pub fn open_default() -> Self {
        Self::bootstrap(default_data_dir())
    }

    /// Load the state at `data_dir` and install the global subscriber with
    /// the configured filter.
    pub fn bootstrap(data_dir: PathBuf) -> Self {
        let state = Self::new(data_dir);
        crate::init_logging(Some(state.log_filter()));
        info!("Data directory: {:?}", state.data_dir);
        state
    }

    /// Tracing filter to use when `RUST_LOG` is not set.
    pub fn log_filter(&self) -> &str {
        self.launcher_settings
            .log_filter
            .as_deref()
            .unwrap_or(crate::DEFAULT_LOG_FILTER)
    }

    pub fn with_version_index(mut self, index: Arc<dyn VersionIndex>) -> Self {
        self.version_index = index;
        self
    }

    pub fn libraries_dir(&self) -> PathBuf {
        self.data_dir.join("libraries")
    }

    pub fn instances_dir(&self) -> PathBuf {
        self.data_dir.join("instances")
    }

    pub fn save_settings(&self) -> LauncherResult<()> {
        let json = serde_json::to_vec_pretty(&self.launcher_settings)?;
        fs::atomic_write(&self.data_dir.join(SETTINGS_FILE), &json)
    }

    /// Strategy for `instance_id`, loading the instance on first use.
    ///
    /// An incomplete version still opens; the caller sees it through
    /// `Profile::is_launchable`.
    pub async fn open_profile(&mut self, instance_id: &str) -> LauncherResult<&mut ProfileStrategy> {
        if !self.profiles.contains_key(instance_id) {
            let instance = self.instance_manager.load(instance_id).await?;
            let mut strategy = ProfileStrategy::new(instance, Some(self.version_index.clone()))
                .with_legacy_upgrade(self.launcher_settings.upgrade_legacy_files);

            match strategy.load() {
                Ok(()) => {}
                Err(e) if e.is_version_incomplete() => {
                    warn!("Opened {} with an incomplete version: {}", instance_id, e)
                }
                Err(e) => return Err(e),
            }

            info!("Opened profile of {}", instance_id);
            self.profiles.insert(instance_id.to_string(), strategy);
        }

        self.profiles
            .get_mut(instance_id)
            .ok_or_else(|| LauncherError::InstanceNotFound(instance_id.to_string()))
    }

    /// Drop the cached strategy; the next open reads everything from disk.
    pub fn close_profile(&mut self, instance_id: &str) -> bool {
        self.profiles.remove(instance_id).is_some()
    }

    pub fn is_open(&self, instance_id: &str) -> bool {
        self.profiles.contains_key(instance_id)
    }
}

fn load_settings_from_disk(data_dir: &Path) -> Option<LauncherSettings> {
    let path = data_dir.join(SETTINGS_FILE);
    let raw = std::fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&raw) {
        Ok(settings) => Some(settings),
        Err(e) => {
            warn!("Ignoring unreadable {:?}: {}", path, e);
            None
        }
    }
}

fn default_base_dir() -> PathBuf {
    dirs::data_dir().unwrap_or_else(|| PathBuf::from("."))
}

pub fn default_data_dir() -> PathBuf {
    let base = default_base_dir();
    let bootstrap_path = base.join(BOOTSTRAP_FILE);

    if let Ok(raw) = std::fs::read_to_string(&bootstrap_path) {
        if let Ok(cfg) = serde_json::from_str::<BootstrapConfig>(&raw) {
            if !cfg.data_dir.exists() {
                let _ = std::fs::create_dir_all(&cfg.data_dir);
            }
            return cfg.data_dir;
        }
    }

    let dir = base.join(APP_DIR_NAME);

    if !dir.exists() {
        let _ = std::fs::create_dir_all(&dir);
    }

    dir
}
