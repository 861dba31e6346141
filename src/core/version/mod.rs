pub mod format;
pub mod index;
pub mod version_file;

pub use format::{parse_json_file, remove_lwjgl, save_patch, to_json};
pub use index::{LocalVersionIndex, VersionIndex};
pub use version_file::{
    Jarmod, LibraryEntry, PatchPtr, VersionFile, MINECRAFT_NAME, MINECRAFT_ORDER, MINECRAFT_UID,
};
