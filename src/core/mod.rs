// ─── InterfaceOficial Core ───
// Version profile backend: an instance's launch configuration is composed
// from ordered patch files.
//
// Architecture:
//   core/
//     instance/   Instance model + CRUD manager
//     version/    Patch file model, JSON format, version index
//     profile/    Patch loading, ordering, merging, mutations, migration
//     loaders/    Installer trait, install tasks, Forge installer
//     maven/      Artifact coordinates
//     state/      Global application state + settings

pub mod error;
pub mod fs;
pub mod instance;
pub mod loaders;
pub mod maven;
pub mod profile;
pub mod state;
pub mod version;
