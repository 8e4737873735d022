//! Filesystem layout for backups, exports and archives.
//!
//! Three base directories, each holding one subdirectory per operation
//! named by a `YYYYMMDD_HHMMSS` timestamp; filenames embed the table name
//! and a `HHMMSS` suffix.

use std::path::{Path, PathBuf};

use chrono::Local;
use pg_curator_api::prelude::StorageLayout;

/// Creates the three base directories if missing.
pub fn ensure_layout(layout: &StorageLayout) -> std::io::Result<()> {
    std::fs::create_dir_all(&layout.backups)?;
    std::fs::create_dir_all(&layout.exports)?;
    std::fs::create_dir_all(&layout.archives)?;
    Ok(())
}

/// `YYYYMMDD_HHMMSS` stamp for per-operation directories.
pub fn dir_stamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// `HHMMSS` suffix embedded in file names.
pub fn time_suffix() -> String {
    Local::now().format("%H%M%S").to_string()
}

/// Creates and returns a fresh timestamped subdirectory under `base`.
pub fn timestamp_dir(base: &Path) -> std::io::Result<PathBuf> {
    let dir = base.join(dir_stamp());
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
