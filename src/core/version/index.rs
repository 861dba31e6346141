// ─── Version Index ───
// Source of pristine (installer-provided) patches. Injected into the
// profile loader; the profile never reaches for a global index.

use std::path::PathBuf;

use tracing::debug;

use super::format::parse_json_file;
use super::version_file::VersionFile;
use crate::core::error::{LauncherError, LauncherResult};

pub trait VersionIndex: Send + Sync {
    /// Pristine patch for component `uid` at `version`, if the index has it.
    ///
    /// The returned patch is not backed by an instance file: `filename` is
    /// empty and `custom` is false.
    fn pristine_patch(&self, uid: &str, version: &str) -> LauncherResult<Option<VersionFile>>;
}

/// Index backed by a local metadata cache laid out as
/// `<root>/<uid>/<version>.json`.
pub struct LocalVersionIndex {
    root: PathBuf,
}

impl LocalVersionIndex {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

impl VersionIndex for LocalVersionIndex {
    fn pristine_patch(&self, uid: &str, version: &str) -> LauncherResult<Option<VersionFile>> {
        let path = self.root.join(uid).join(format!("{}.json", version));
        if !path.is_file() {
            debug!("Version index has no {} {}", uid, version);
            return Ok(None);
        }

        let mut file = parse_json_file(&path, false)?;
        if file.file_id.is_empty() {
            file.file_id = uid.to_string();
        } else if file.file_id != uid {
            return Err(LauncherError::PatchIdMismatch {
                expected: uid.to_string(),
                found: file.file_id,
            });
        }
        if file.version.is_empty() {
            file.version = version.to_string();
        }
        file.filename = PathBuf::new();
        file.custom = false;
        Ok(Some(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn serves_pristine_patch_without_filename() {
        let dir = TempDir::new().unwrap();
        let uid_dir = dir.path().join("net.minecraft");
        std::fs::create_dir_all(&uid_dir).unwrap();
        std::fs::write(
            uid_dir.join("1.7.10.json"),
            r#"{"name":"Minecraft","order":-2,"mainClass":"net.minecraft.client.main.Main"}"#,
        )
        .unwrap();

        let index = LocalVersionIndex::new(dir.path().to_path_buf());
        let file = index
            .pristine_patch("net.minecraft", "1.7.10")
            .unwrap()
            .unwrap();

        assert_eq!(file.file_id, "net.minecraft");
        assert_eq!(file.version, "1.7.10");
        assert!(file.filename.as_os_str().is_empty());
        assert!(!file.is_custom());
    }

    #[test]
    fn unknown_version_is_none() {
        let dir = TempDir::new().unwrap();
        let index = LocalVersionIndex::new(dir.path().to_path_buf());
        assert!(index.pristine_patch("net.minecraft", "1.0").unwrap().is_none());
    }

    #[test]
    fn mismatched_identity_is_rejected() {
        let dir = TempDir::new().unwrap();
        let uid_dir = dir.path().join("net.minecraft");
        std::fs::create_dir_all(&uid_dir).unwrap();
        std::fs::write(uid_dir.join("1.8.json"), r#"{"fileId":"org.evil"}"#).unwrap();

        let index = LocalVersionIndex::new(dir.path().to_path_buf());
        let err = index.pristine_patch("net.minecraft", "1.8").unwrap_err();
        assert!(matches!(err, LauncherError::PatchIdMismatch { .. }));
    }
}
