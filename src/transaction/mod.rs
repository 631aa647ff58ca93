//! Staging transactions for atomic component installs
//!
//! Every component is executed into its own staging directory first. Only
//! when all of its actions succeeded are the staged files promoted into the
//! target, after backing up every destination that already exists.
//!
//! ## Usage
//!
//! ```ignore
//! let mut transaction = StagingTransaction::begin(target, "core")?;
//! std::fs::write(transaction.stage("settings.json")?, content)?;
//! transaction.promote()?;
//!
//! // On success the staging dir is removed, backups are kept:
//! let changes = transaction.commit()?;
//!
//! // Later in the same run, if another component fails:
//! changes.rollback();
//!
//! // When the run is over:
//! changes.discard()?;
//! ```
//!
//! A transaction dropped without `commit` restores any promoted files from
//! their backups and removes its scratch directories. Scratch directories
//! always carry the [`SENTINEL_FILE`] marker and are never removed without it.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::common::fs::{self as fs_utils, SENTINEL_FILE};
use crate::config::engine::STATE_DIR;
use crate::error::{Result, fs as fs_error};

/// Subdirectory of the state dir holding staging and backup dirs
pub const STAGING_DIR: &str = "staging";

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// `<target>/.confstrap/staging`
pub fn staging_root(target_dir: &Path) -> PathBuf {
    target_dir.join(STATE_DIR).join(STAGING_DIR)
}

fn unique_name(component_id: &str) -> String {
    format!(
        "{}-{}-{}",
        component_id,
        std::process::id(),
        SEQUENCE.fetch_add(1, Ordering::Relaxed)
    )
}

/// Scratch state of one component install
#[derive(Debug)]
pub struct StagingTransaction {
    target_dir: PathBuf,
    component_id: String,
    stage_dir: PathBuf,
    backup_dir: PathBuf,
    /// Relative target paths written into the stage dir
    staged: Vec<String>,
    /// Relative target paths that existed and were backed up
    backed_up: Vec<String>,
    /// Relative target paths that did not exist before promotion
    created: Vec<String>,
    committed: bool,
}

impl StagingTransaction {
    /// Create sentinel-marked stage and backup dirs for a component
    pub fn begin(target_dir: &Path, component_id: &str) -> Result<Self> {
        let root = staging_root(target_dir);
        let name = unique_name(component_id);
        let stage_dir = root.join(format!("{name}.stage"));
        let backup_dir = root.join(format!("{name}.backup"));

        fs_utils::create_marked_dir(&stage_dir)?;
        fs_utils::create_marked_dir(&backup_dir)?;
        log::debug!("Staging {} in {}", component_id, stage_dir.display());

        Ok(Self {
            target_dir: target_dir.to_path_buf(),
            component_id: component_id.to_string(),
            stage_dir,
            backup_dir,
            staged: Vec::new(),
            backed_up: Vec::new(),
            created: Vec::new(),
            committed: false,
        })
    }

    /// Register a relative target path and return where to write it in staging
    pub fn stage(&mut self, target_path: &str) -> Result<PathBuf> {
        let staged = self.stage_dir.join(target_path);
        fs_utils::ensure_parent_dir(&staged)?;
        if !self.staged.iter().any(|p| p == target_path) {
            self.staged.push(target_path.to_string());
        }
        Ok(staged)
    }

    pub fn stage_dir(&self) -> &Path {
        &self.stage_dir
    }

    pub fn staged_files(&self) -> &[String] {
        &self.staged
    }

    /// Back up existing destinations, then copy every staged file into place
    ///
    /// On failure the destinations promoted so far are restored before the
    /// error is returned.
    pub fn promote(&mut self) -> Result<()> {
        for rel in &self.staged {
            let destination = self.target_dir.join(rel);
            if destination.is_file() {
                fs_utils::copy_file(&destination, &self.backup_dir.join(rel))?;
                self.backed_up.push(rel.clone());
            }
        }

        let staged = self.staged.clone();
        for rel in &staged {
            let destination = self.target_dir.join(rel);
            let existed = self.backed_up.contains(rel);
            if let Err(e) = fs_utils::atomic_copy(&self.stage_dir.join(rel), &destination) {
                log::warn!(
                    "Promotion of {} failed at {}, restoring",
                    self.component_id,
                    rel
                );
                self.restore();
                return Err(e);
            }
            if !existed {
                self.created.push(rel.clone());
            }
        }

        log::debug!(
            "Promoted {} file(s) for {} ({} backed up)",
            staged.len(),
            self.component_id,
            self.backed_up.len()
        );
        Ok(())
    }

    /// Undo whatever promotion has done so far
    fn restore(&mut self) {
        restore_files(
            &self.target_dir,
            &self.backup_dir,
            &self.backed_up,
            &self.created,
        );
        self.created.clear();
    }

    /// Finish the transaction: drop the stage dir, keep backups for the run
    ///
    /// If the stage dir cannot be removed the transaction is not committed,
    /// and dropping it restores the promoted files.
    pub fn commit(mut self) -> Result<CommittedChanges> {
        fs_utils::remove_marked_dir(&self.stage_dir)?;
        self.committed = true;

        Ok(CommittedChanges {
            target_dir: self.target_dir.clone(),
            component_id: std::mem::take(&mut self.component_id),
            backup_dir: std::mem::take(&mut self.backup_dir),
            backed_up: std::mem::take(&mut self.backed_up),
            created: std::mem::take(&mut self.created),
        })
    }
}

impl Drop for StagingTransaction {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if !self.created.is_empty() || !self.backed_up.is_empty() {
            self.restore();
        }
        for dir in [&self.stage_dir, &self.backup_dir] {
            if let Err(e) = fs_utils::remove_marked_dir(dir) {
                log::warn!("Failed to clean up {}: {}", dir.display(), e);
            }
        }
    }
}

/// What a committed component changed in the target
///
/// Kept until the end of the install run so the component can still be
/// rolled back if a later component fails.
#[derive(Debug)]
pub struct CommittedChanges {
    target_dir: PathBuf,
    component_id: String,
    backup_dir: PathBuf,
    backed_up: Vec<String>,
    created: Vec<String>,
}

impl CommittedChanges {
    pub fn component_id(&self) -> &str {
        &self.component_id
    }

    /// Restore overwritten files from backup and delete newly created ones
    pub fn rollback(&self) {
        restore_files(
            &self.target_dir,
            &self.backup_dir,
            &self.backed_up,
            &self.created,
        );
    }

    /// Drop the retained backups
    pub fn discard(self) -> Result<()> {
        fs_utils::remove_marked_dir(&self.backup_dir)
    }
}

fn restore_files(target_dir: &Path, backup_dir: &Path, backed_up: &[String], created: &[String]) {
    for rel in backed_up {
        if let Err(e) = fs_utils::atomic_copy(&backup_dir.join(rel), &target_dir.join(rel)) {
            log::warn!("Failed to restore {}: {}", rel, e);
        }
    }
    for rel in created {
        let path = target_dir.join(rel);
        if path.exists() {
            if let Err(e) = fs::remove_file(&path) {
                log::warn!("Failed to remove {}: {}", path.display(), e);
                continue;
            }
        }
        if let Some(parent) = path.parent() {
            fs_utils::remove_empty_parents(parent, target_dir);
        }
    }
}

/// Remove scratch dirs left behind by interrupted runs
///
/// Only sentinel-marked directories are removed; anything else under the
/// staging root is left alone with a warning. Returns the number removed.
pub fn sweep_orphans(target_dir: &Path) -> Result<usize> {
    let root = staging_root(target_dir);
    if !root.is_dir() {
        return Ok(0);
    }

    let mut removed = 0;
    let entries = fs::read_dir(&root).map_err(|e| fs_error::read_failed(&root, e))?;
    for entry in entries.filter_map(std::result::Result::ok) {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        match fs_utils::remove_marked_dir(&path) {
            Ok(()) => {
                log::info!("Removed orphaned staging dir {}", path.display());
                removed += 1;
            }
            Err(e) => log::warn!("Not removing {}: {} ({} missing)", path.display(), e, SENTINEL_FILE),
        }
    }
    Ok(removed)
}
