//! Store file placement.
//!
//! The snapshot prefers the user's config directory and falls back in two
//! steps when that is unavailable: a piazza subdirectory of the system
//! temp dir, then a fixed file directly in the temp dir. Startup never
//! fails over placement; the worst case is a store that does not survive
//! a reboot.

use std::fs;
use std::path::PathBuf;

use tracing::warn;

pub fn default_store_path() -> PathBuf {
    if let Some(base) = dirs::config_dir() {
        let app_dir = base.join("piazza");
        match fs::create_dir_all(&app_dir) {
            Ok(()) => return app_dir.join("users.json"),
            Err(e) => {
                warn!("config dir {} unusable ({e}), falling back to temp", app_dir.display());
            }
        }
    }
    let tmp_dir = std::env::temp_dir().join("piazza");
    match fs::create_dir_all(&tmp_dir) {
        Ok(()) => tmp_dir.join("users.json"),
        Err(e) => {
            warn!("temp dir {} unusable ({e}), using last-resort path", tmp_dir.display());
            std::env::temp_dir().join("piazza_users.json")
        }
    }
}

/// Where a snapshot goes when the configured path stops being writable
/// mid-run.
pub(crate) fn emergency_snapshot_path() -> PathBuf {
    std::env::temp_dir().join("piazza_users_emergency.json")
}
