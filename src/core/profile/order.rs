// ─── Patch Order Store ───
// `order.json`: the explicit, user-chosen patch order. Kept apart from the
// patches so it can be reset without touching their content.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::error::LauncherResult;
use crate::core::fs;

/// Ordered list of patch `fileId`s.
pub type PatchOrder = Vec<String>;

const ORDER_FILE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct OrderFile {
    version: u32,
    #[serde(default)]
    order: PatchOrder,
}

/// Read the saved order. A missing, unreadable or unknown-format file yields
/// an empty order; only the latter two are worth a warning.
pub fn read_override_orders(path: &Path) -> PatchOrder {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No patch order at {:?}", path);
            return PatchOrder::new();
        }
        Err(e) => {
            warn!("Couldn't read patch order {:?}: {}", path, e);
            return PatchOrder::new();
        }
    };

    match serde_json::from_str::<OrderFile>(&raw) {
        Ok(file) if file.version == ORDER_FILE_VERSION => dedup(file.order),
        Ok(file) => {
            warn!(
                "Ignoring patch order {:?}: unsupported version {}",
                path, file.version
            );
            PatchOrder::new()
        }
        Err(e) => {
            warn!("Ignoring malformed patch order {:?}: {}", path, e);
            PatchOrder::new()
        }
    }
}

/// Persist `order` with atomic replace semantics.
pub fn write_override_orders(path: &Path, order: &[String]) -> LauncherResult<()> {
    let file = OrderFile {
        version: ORDER_FILE_VERSION,
        order: order.to_vec(),
    };
    let data = serde_json::to_vec_pretty(&file)?;
    fs::ensure_parent_dir(path)?;
    fs::atomic_write(path, &data)
}

/// Forget the saved order. Returns whether a file was removed.
pub fn remove_override_orders(path: &Path) -> LauncherResult<bool> {
    fs::remove_file_if_exists(path)
}

// An id listed twice would be loaded twice.
fn dedup(order: PatchOrder) -> PatchOrder {
    let mut seen = std::collections::HashSet::new();
    order
        .into_iter()
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn write_then_read_preserves_sequence() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("order.json");
        let order = vec!["b".to_string(), "a".to_string(), "c".to_string()];

        write_override_orders(&path, &order).unwrap();

        assert_eq!(read_override_orders(&path), order);
        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["version"], 1);
    }

    #[test]
    fn missing_or_broken_file_is_empty_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("order.json");
        assert!(read_override_orders(&path).is_empty());

        std::fs::write(&path, "not json").unwrap();
        assert!(read_override_orders(&path).is_empty());

        std::fs::write(&path, r#"{"version": 2, "order": ["a"]}"#).unwrap();
        assert!(read_override_orders(&path).is_empty());
    }

    #[test]
    fn duplicate_ids_are_collapsed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("order.json");
        std::fs::write(&path, r#"{"version": 1, "order": ["a", "b", "a"]}"#).unwrap();

        assert_eq!(read_override_orders(&path), vec!["a", "b"]);
    }

    #[test]
    fn remove_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("order.json");
        write_override_orders(&path, &["a".to_string()]).unwrap();

        assert!(remove_override_orders(&path).unwrap());
        assert!(!remove_override_orders(&path).unwrap());
    }
}
