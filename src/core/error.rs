use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the profile backend.
/// Every module returns `Result<T, LauncherError>`.
#[derive(Debug, Error)]
pub enum LauncherError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed patch file {path:?}: {reason}")]
    MalformedPatch { path: PathBuf, reason: String },

    // ── Maven ───────────────────────────────────────────
    #[error("Invalid Maven coordinate: {0}")]
    InvalidMavenCoordinate(String),

    // ── Profile load ────────────────────────────────────
    #[error("load id {expected} does not match internal id {found}")]
    PatchIdMismatch { expected: String, found: String },

    #[error("{second} has the same order ({order}) as {first}")]
    DuplicatePatchOrder {
        first: String,
        second: String,
        order: i32,
    },

    #[error("Patch {0} is already part of the profile")]
    DuplicatePatch(String),

    /// The merged profile lacks a required component. Reloads after a
    /// mutation treat this as recoverable.
    #[error("Version is incomplete: missing {0}")]
    VersionIncomplete(String),

    // ── Profile mutation ────────────────────────────────
    #[error("Patch not found: {0}")]
    PatchNotFound(String),

    #[error("Patch {0} is already customized")]
    PatchAlreadyCustom(String),

    #[error("Patch {0} cannot be moved")]
    PatchNotMovable(String),

    #[error("Patch {0} cannot be removed")]
    PatchNotRemovable(String),

    #[error("No free patch order left above {0}")]
    NoFreeOrder(i32),

    #[error("Jar mod target already exists: {0:?}")]
    JarModExists(PathBuf),

    // ── Instance ────────────────────────────────────────
    #[error("Instance not found: {0}")]
    InstanceNotFound(String),

    #[error("Instance already exists: {0}")]
    InstanceAlreadyExists(String),

    // ── Loader ──────────────────────────────────────────
    #[error("Loader error: {0}")]
    Loader(String),

    // ── Archive ─────────────────────────────────────────
    #[error("Zip extraction error: {0}")]
    Zip(#[from] zip::result::ZipError),

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type LauncherResult<T> = Result<T, LauncherError>;

impl LauncherError {
    /// Shorthand for wrapping an IO error with the path it happened at.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LauncherError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn is_version_incomplete(&self) -> bool {
        matches!(self, LauncherError::VersionIncomplete(_))
    }

    /// Errors that make a loaded profile unusable for launching.
    pub fn is_hard_load_error(&self) -> bool {
        matches!(
            self,
            LauncherError::PatchIdMismatch { .. }
                | LauncherError::DuplicatePatchOrder { .. }
                | LauncherError::DuplicatePatch(_)
                | LauncherError::MalformedPatch { .. }
        )
    }
}

impl From<std::io::Error> for LauncherError {
    fn from(source: std::io::Error) -> Self {
        LauncherError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

// ── Serialization for the command layer ─────────────────
// Front ends receive the error as its display string.
impl serde::Serialize for LauncherError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_mismatch_message_names_both_ids() {
        let err = LauncherError::PatchIdMismatch {
            expected: "net.minecraftforge".into(),
            found: "com.mumfrey.liteloader".into(),
        };
        assert_eq!(
            err.to_string(),
            "load id net.minecraftforge does not match internal id com.mumfrey.liteloader"
        );
        assert!(err.is_hard_load_error());
        assert!(!err.is_version_incomplete());
    }

    #[test]
    fn incomplete_version_is_not_a_hard_error() {
        let err = LauncherError::VersionIncomplete("net.minecraft".into());
        assert!(err.is_version_incomplete());
        assert!(!err.is_hard_load_error());
    }

    #[test]
    fn serializes_as_display_string() {
        let err = LauncherError::PatchNotFound("org.example".into());
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(json, "\"Patch not found: org.example\"");
    }
}
