pub mod loader;
pub mod minecraft_profile;
pub mod order;
pub mod strategy;
pub mod upgrade;

pub use loader::PatchLoader;
pub use minecraft_profile::{LaunchProfile, Profile};
pub use order::PatchOrder;
pub use strategy::{MoveDirection, ProfileStrategy, JARMOD_UID_PREFIX};
pub use upgrade::{upgrade_deprecated_files, UpgradeOutcome};
