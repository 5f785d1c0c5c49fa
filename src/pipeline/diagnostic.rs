//! Pipeline diagnostic dump — writes intermediate artifacts to disk.
//!
//! Enables inspection of every scan stage: the normalized image, raw OCR
//! text, and the parsed field report.
//!
//! **Activation**:
//! - Dev builds (`is_dev()`): auto-enabled, writes to `~/Labsight/diagnostic/`
//! - Prod builds: disabled unless `LABSIGHT_DUMP_DIR` env var is set
//! - `LABSIGHT_DUMP_DIR` overrides the default in both modes
//!
//! Dumping is best-effort: writers log failures and never panic, never block
//! the pipeline.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::config;

/// Diagnostic dump subdirectory name inside app data.
const DIAGNOSTIC_SUBDIR: &str = "diagnostic";

/// Resolve the base dump directory.
///
/// Priority:
/// 1. `LABSIGHT_DUMP_DIR` env var (explicit override, any build)
/// 2. `~/Labsight/diagnostic/` in dev builds (auto-enabled)
/// 3. `None` in production (disabled by default)
fn resolve_base_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("LABSIGHT_DUMP_DIR") {
        return Some(PathBuf::from(dir));
    }

    if config::is_dev() {
        return Some(config::app_data_dir().join(DIAGNOSTIC_SUBDIR));
    }

    None
}

/// Returns the dump directory for a scan, or `None` if diagnostics are disabled.
///
/// Creates the directory tree on first call. Returns `None` (with a warning) if
/// directory creation fails.
pub fn dump_dir_for(scan_id: &Uuid) -> Option<PathBuf> {
    let base = resolve_base_dir()?;
    let dir = base.join(scan_id.to_string());

    if let Err(e) = std::fs::create_dir_all(&dir) {
        tracing::warn!(
            path = %dir.display(),
            error = %e,
            "Diagnostic dump: failed to create directory"
        );
        return None;
    }

    Some(dir)
}

/// Write a binary artifact (PNG image, raw bytes).
pub fn dump_binary(dir: &Path, filename: &str, data: &[u8]) {
    let path = dir.join(filename);
    match std::fs::write(&path, data) {
        Ok(()) => tracing::debug!(
            path = %path.display(),
            size = data.len(),
            "Diagnostic dump: binary written"
        ),
        Err(e) => tracing::warn!(
            path = %path.display(),
            error = %e,
            "Diagnostic dump: failed to write binary"
        ),
    }
}

/// Write a text artifact (raw OCR output).
pub fn dump_text(dir: &Path, filename: &str, text: &str) {
    let path = dir.join(filename);
    match std::fs::write(&path, text.as_bytes()) {
        Ok(()) => tracing::debug!(
            path = %path.display(),
            size = text.len(),
            "Diagnostic dump: text written"
        ),
        Err(e) => tracing::warn!(
            path = %path.display(),
            error = %e,
            "Diagnostic dump: failed to write text"
        ),
    }
}

/// Write a JSON artifact (any serde-serializable value), pretty-printed.
pub fn dump_json<T: serde::Serialize>(dir: &Path, filename: &str, value: &T) {
    let path = dir.join(filename);
    match serde_json::to_string_pretty(value) {
        Ok(json) => match std::fs::write(&path, json.as_bytes()) {
            Ok(()) => tracing::debug!(
                path = %path.display(),
                size = json.len(),
                "Diagnostic dump: JSON written"
            ),
            Err(e) => tracing::warn!(
                path = %path.display(),
                error = %e,
                "Diagnostic dump: failed to write JSON"
            ),
        },
        Err(e) => tracing::warn!(
            path = %path.display(),
            error = %e,
            "Diagnostic dump: failed to serialize JSON"
        ),
    }
}
