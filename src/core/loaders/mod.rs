pub mod context;
pub mod forge;
pub mod installer;

pub use context::InstallContext;
pub use forge::{ForgeInstaller, FORGE_UID};
pub use installer::{create_install_task, InstallTask, LoaderInstaller, LoaderVersion};
