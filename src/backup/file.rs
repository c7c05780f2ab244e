//! Snapshot file persistence
//!
//! Writes are atomic: the JSON goes to `<path>.tmp`, is fsynced, renamed
//! over `<path>`, and the parent directory is fsynced. A failed write
//! leaves any previous file at `<path>` untouched and removes the
//! temporary file.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::errors::{BackupError, BackupResult};

/// Temporary sibling used while writing `path`
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Replace `path` with `contents`, durably
pub fn write_atomic(path: &Path, contents: &str) -> BackupResult<()> {
    let temp = temp_path(path);

    let result = write_synced(&temp, contents)
        .and_then(|()| fs::rename(&temp, path).map_err(|e| BackupError::io_error_at_path(path, e)))
        .and_then(|()| fsync_parent(path));

    if result.is_err() {
        cleanup_partial(&temp);
    }

    result
}

fn write_synced(path: &Path, contents: &str) -> BackupResult<()> {
    let mut file = File::create(path).map_err(|e| BackupError::io_error_at_path(path, e))?;
    file.write_all(contents.as_bytes())
        .map_err(|e| BackupError::io_error_at_path(path, e))?;
    file.sync_all()
        .map_err(|e| BackupError::io_error_at_path(path, e))
}

/// fsync the directory holding `path`
fn fsync_parent(path: &Path) -> BackupResult<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let dir = OpenOptions::new()
        .read(true)
        .open(parent)
        .map_err(|e| BackupError::io_error_at_path(parent, e))?;
    dir.sync_all()
        .map_err(|e| BackupError::io_error_at_path(parent, e))
}

/// Delete a partial file if it exists
pub fn cleanup_partial(path: &Path) {
    if path.exists() {
        let _ = fs::remove_file(path);
    }
}

/// Read a snapshot file as text
pub fn read_snapshot(path: &Path) -> BackupResult<String> {
    fs::read_to_string(path).map_err(|e| BackupError::io_error_at_path(path, e))
}
