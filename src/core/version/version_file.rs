// ─── Version File ───
// One version fragment ("patch") of an instance profile, plus the library
// and jar mod descriptors it carries. OS rules for libraries live here too.

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::maven::MavenArtifact;

/// Identity of the base game patch.
pub const MINECRAFT_UID: &str = "net.minecraft";
/// Display name of the base game patch.
pub const MINECRAFT_NAME: &str = "Minecraft";
/// Intrinsic order of the base game patch; it sorts ahead of everything.
pub const MINECRAFT_ORDER: i32 = -2;

/// A single patch fragment as stored in `patches/<fileId>.json`.
///
/// Loaded once, then shared behind an `Arc` (see [`PatchPtr`]). The fields
/// marked `serde(skip)` are runtime state assigned by whoever loaded it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VersionFile {
    #[serde(default)]
    pub file_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub order: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mc_version: Option<String>,
    /// Legacy `id` of single-file version descriptions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applet_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minecraft_arguments: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub release_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assets: Option<String>,
    #[serde(rename = "+tweakers", default, skip_serializing_if = "Vec::is_empty")]
    pub tweakers: Vec<String>,
    #[serde(rename = "+traits", default, skip_serializing_if = "BTreeSet::is_empty")]
    pub traits: BTreeSet<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub libraries: Vec<LibraryEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub jar_mods: Vec<Jarmod>,

    // ── Runtime state ──
    /// Absolute path of the on-disk representation. Empty for patches that
    /// were never persisted (e.g. served by the version index).
    #[serde(skip)]
    pub filename: PathBuf,
    #[serde(skip)]
    pub removable: bool,
    #[serde(skip)]
    pub movable: bool,
    /// Read from the instance's own `patches/` directory, i.e. user-owned.
    #[serde(skip)]
    pub custom: bool,
}

/// Shared handle to a loaded patch. The profile and any front-end surface
/// may hold one at the same time.
pub type PatchPtr = std::sync::Arc<VersionFile>;

impl VersionFile {
    pub fn is_base_game(&self) -> bool {
        self.file_id == MINECRAFT_UID
    }

    pub fn is_custom(&self) -> bool {
        self.custom
    }

    pub fn is_removable(&self) -> bool {
        self.removable
    }

    pub fn is_movable(&self) -> bool {
        self.movable
    }

    /// Set both mutation flags, except on the base game which stays pinned.
    pub fn set_mutable(&mut self, mutable: bool) {
        let allowed = mutable && !self.is_base_game();
        self.removable = allowed;
        self.movable = allowed;
    }
}

/// A jar mod copied into the instance's jar mod directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Jarmod {
    /// File name inside the jar mod directory (`<uuid>.jar`).
    pub name: String,
    /// Display name derived from the file the user picked.
    #[serde(default)]
    pub original_name: String,
}

// ─── Library Entry with Rules ───

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LibraryEntry {
    pub name: String,
    /// Repository base for libraries without explicit downloads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downloads: Option<LibraryDownloads>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<LibraryRule>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub natives: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LibraryDownloads {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<LibDownloadArtifact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classifiers: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LibDownloadArtifact {
    pub path: String,
    pub sha1: String,
    pub size: u64,
    pub url: String,
}

// ─── OS Rule Evaluation ───

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LibraryRule {
    pub action: RuleAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<OsRule>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Disallow,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OsRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl LibraryEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: None,
            downloads: None,
            rules: None,
            natives: None,
        }
    }

    pub fn artifact(&self) -> Option<MavenArtifact> {
        MavenArtifact::parse(&self.name).ok()
    }

    /// Identity used when a later patch replaces this library. Falls back to
    /// the raw name for entries that are not Maven coordinates.
    pub fn artifact_prefix(&self) -> String {
        self.artifact()
            .map(|a| a.artifact_prefix())
            .unwrap_or_else(|| self.name.clone())
    }

    /// Libraries from the discontinued LWJGL bundling; these are supplied
    /// separately and must not leak into migrated patches.
    pub fn is_lwjgl(&self) -> bool {
        match self.artifact() {
            Some(a) => a.group_id.starts_with("org.lwjgl"),
            None => self.name.contains("lwjgl"),
        }
    }

    /// Evaluate whether this library should be included for the current OS.
    ///
    /// Rules logic (Mojang format):
    /// - If no rules → allowed.
    /// - Process rules top-to-bottom. Start with "disallowed".
    /// - Each rule either sets "allow" or "disallow" if the OS matches (or if no OS is specified).
    /// - Final state determines inclusion.
    pub fn is_allowed_for_current_os(&self) -> bool {
        let rules = match &self.rules {
            Some(r) => r,
            None => return true,
        };

        let current_os = current_os_name();
        let mut allowed = false;

        for rule in rules {
            let os_matches = match &rule.os {
                None => true,
                Some(os) => match &os.name {
                    None => true,
                    Some(name) => name == current_os,
                },
            };

            if os_matches {
                allowed = rule.action == RuleAction::Allow;
            }
        }

        allowed
    }
}

/// Get the Mojang OS name for the current platform.
pub(crate) fn current_os_name() -> &'static str {
    if cfg!(target_os = "windows") {
        "windows"
    } else if cfg!(target_os = "macos") {
        "osx"
    } else {
        "linux"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_rules_means_allowed() {
        let lib = LibraryEntry::new("test:lib:1.0");
        assert!(lib.is_allowed_for_current_os());
    }

    #[test]
    fn allow_only_current_os() {
        let mut lib = LibraryEntry::new("test:lib:1.0");
        lib.rules = Some(vec![LibraryRule {
            action: RuleAction::Allow,
            os: Some(OsRule {
                name: Some(current_os_name().to_string()),
                arch: None,
                version: None,
            }),
        }]);
        assert!(lib.is_allowed_for_current_os());
    }

    #[test]
    fn disallow_current_os() {
        let mut lib = LibraryEntry::new("test:lib:1.0");
        lib.rules = Some(vec![
            LibraryRule {
                action: RuleAction::Allow,
                os: None,
            },
            LibraryRule {
                action: RuleAction::Disallow,
                os: Some(OsRule {
                    name: Some(current_os_name().to_string()),
                    arch: None,
                    version: None,
                }),
            },
        ]);
        assert!(!lib.is_allowed_for_current_os());
    }

    #[test]
    fn lwjgl_detection_uses_group() {
        assert!(LibraryEntry::new("org.lwjgl.lwjgl:lwjgl:2.9.1").is_lwjgl());
        assert!(LibraryEntry::new("org.lwjgl:lwjgl-glfw:3.3.3").is_lwjgl());
        assert!(!LibraryEntry::new("net.java.jinput:jinput:2.0.5").is_lwjgl());
    }

    #[test]
    fn base_game_is_never_mutable() {
        let mut base = VersionFile {
            file_id: MINECRAFT_UID.into(),
            ..Default::default()
        };
        base.set_mutable(true);
        assert!(!base.is_removable());
        assert!(!base.is_movable());

        let mut forge = VersionFile {
            file_id: "net.minecraftforge".into(),
            ..Default::default()
        };
        forge.set_mutable(true);
        assert!(forge.is_removable());
        assert!(forge.is_movable());
    }

    #[test]
    fn deserializes_plus_prefixed_fields() {
        let file: VersionFile = serde_json::from_value(serde_json::json!({
            "fileId": "net.minecraftforge",
            "order": 5,
            "+tweakers": ["cpw.mods.fml.common.launcher.FMLTweaker"],
            "+traits": ["FirstThreadOnMacOS"],
            "jarMods": [{"name": "a.jar", "originalName": "A"}]
        }))
        .unwrap();

        assert_eq!(file.order, 5);
        assert_eq!(file.tweakers.len(), 1);
        assert!(file.traits.contains("FirstThreadOnMacOS"));
        assert_eq!(file.jar_mods[0].original_name, "A");
        assert!(!file.is_custom());
    }
}
