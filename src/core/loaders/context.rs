use std::path::PathBuf;

/// Everything an installer needs, owned so the install can run as a
/// detached task.
#[derive(Debug, Clone)]
pub struct InstallContext {
    pub minecraft_version: String,
    pub loader_version: String,
    /// Installer archive already present on disk.
    pub installer_path: PathBuf,
    /// Shared Maven-layout libraries directory.
    pub libs_dir: PathBuf,
}
