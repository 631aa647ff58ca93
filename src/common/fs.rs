//! Common file system operations with unified error handling
//!
//! Writes go through a temp file in the destination directory followed by a
//! rename. Scratch directories carry a sentinel marker file, and
//! [`remove_marked_dir`] refuses to delete any directory without one.

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::{Result, fs as fs_error};

/// Name of the sentinel file marking an engine-owned scratch directory
pub const SENTINEL_FILE: &str = ".confstrap-staging";

/// Ensure parent directory exists for a path
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| fs_error::write_failed(parent, e))?;
    }
    Ok(())
}

/// Write content atomically: temp file in the same directory, then rename
pub fn atomic_write(path: &Path, content: impl AsRef<[u8]>) -> Result<()> {
    ensure_parent_dir(path)?;
    let dir = path.parent().unwrap_or_else(|| Path::new("."));

    let mut temp = NamedTempFile::new_in(dir).map_err(|e| fs_error::write_failed(path, e))?;
    temp.write_all(content.as_ref())
        .map_err(|e| fs_error::write_failed(path, e))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| fs_error::write_failed(path, e))?;
    temp.persist(path)
        .map_err(|e| fs_error::write_failed(path, e.error))?;

    Ok(())
}

/// Copy a file atomically, preserving permission bits
pub fn atomic_copy(source: &Path, target: &Path) -> Result<()> {
    let content = fs::read(source).map_err(|e| fs_error::read_failed(source, e))?;
    atomic_write(target, content)?;
    let permissions = fs::metadata(source)
        .map_err(|e| fs_error::read_failed(source, e))?
        .permissions();
    fs::set_permissions(target, permissions).map_err(|e| fs_error::write_failed(target, e))
}

/// Plain copy creating parent directories
pub fn copy_file(source: &Path, target: &Path) -> Result<()> {
    ensure_parent_dir(target)?;
    fs::copy(source, target)
        .map(|_| ())
        .map_err(|e| fs_error::write_failed(target, e))
}

/// Create a directory and drop the sentinel marker into it
pub fn create_marked_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| fs_error::write_failed(path, e))?;
    fs::write(path.join(SENTINEL_FILE), b"confstrap scratch directory\n")
        .map_err(|e| fs_error::write_failed(path, e))
}

/// Whether a directory carries the sentinel marker
pub fn is_marked(path: &Path) -> bool {
    path.join(SENTINEL_FILE).is_file()
}

/// Remove a scratch directory, refusing when it lacks the sentinel marker
///
/// A directory that no longer exists is not an error.
pub fn remove_marked_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }
    if !is_marked(path) {
        return Err(fs_error::unsafe_removal(path));
    }
    fs::remove_dir_all(path).map_err(|e| fs_error::write_failed(path, e))
}

/// Remove empty directories from `start` upwards, stopping at `root`
pub fn remove_empty_parents(start: &Path, root: &Path) {
    let mut current = Some(start);
    while let Some(dir) = current {
        if dir == root || !dir.starts_with(root) {
            break;
        }
        let is_empty = fs::read_dir(dir)
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(false);
        if !is_empty || fs::remove_dir(dir).is_err() {
            break;
        }
        current = dir.parent();
    }
}

/// Apply POSIX permission bits (no-op on non-Unix platforms)
#[cfg(unix)]
pub fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .map_err(|e| fs_error::write_failed(path, e))
}

/// Apply POSIX permission bits (no-op on non-Unix platforms)
#[cfg(not(unix))]
pub fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}

/// Whether a file has any executable bit set
#[cfg(unix)]
pub fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path)
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// Whether a file has any executable bit set
#[cfg(not(unix))]
pub fn is_executable(_path: &Path) -> bool {
    false
}
