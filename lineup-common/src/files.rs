//! Whole-file writes for the JSON sidecars

use crate::Result;
use serde::Serialize;
use std::path::Path;

/// Serialize `value` as pretty JSON to `path` via a temp file + rename
///
/// Parent directories are created as needed.
pub fn write_json_atomically<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, serde_json::to_string_pretty(value)?)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}
