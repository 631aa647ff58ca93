//! Plan execution for confstrap components
//!
//! This module handles:
//! - Executing each component's actions into a staging transaction
//! - Promoting staged files into the target and writing the receipt
//! - Rolling back every component of the run when one fails
//! - Uninstalling components from their receipts
//!
//! Components are installed strictly in plan order. A component either lands
//! completely, with its receipt, or leaves the target as it found it.

mod actions;
pub mod observer;


use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::common::fs as fs_utils;
use crate::domain::{ActionKind, ComponentPlan, FileAction, InstallPlan, Receipt};
use crate::error::{Result, fs as fs_error, install as install_error};
use crate::hash;
use crate::merge::TemplateRenderer;
use crate::receipts::ReceiptStore;
use crate::transaction::{CommittedChanges, StagingTransaction};

use actions::ActionContext;
pub use observer::{InstallObserver, NoopObserver};

static NOOP_OBSERVER: NoopObserver = NoopObserver;

/// A component installed earlier in the current run
struct CompletedComponent {
    changes: CommittedChanges,
    previous: Option<Receipt>,
}

/// Executes install plans against one target directory
pub struct Installer<'a> {
    target_dir: PathBuf,
    receipts: &'a ReceiptStore,
    renderer: &'a dyn TemplateRenderer,
    variables: BTreeMap<String, String>,
    observer: &'a dyn InstallObserver,
}

impl<'a> Installer<'a> {
    pub fn new(
        target_dir: &Path,
        receipts: &'a ReceiptStore,
        renderer: &'a dyn TemplateRenderer,
    ) -> Self {
        Self {
            target_dir: target_dir.to_path_buf(),
            receipts,
            renderer,
            variables: BTreeMap::new(),
            observer: &NOOP_OBSERVER,
        }
    }

    /// Variables available to templates, besides the built-in ones
    pub fn with_variables(mut self, variables: BTreeMap<String, String>) -> Self {
        self.variables = variables;
        self
    }

    pub fn with_observer(mut self, observer: &'a dyn InstallObserver) -> Self {
        self.observer = observer;
        self
    }

    /// Install every component of `plan` in order
    ///
    /// Returns per-component success. On failure every component completed
    /// in this call is rolled back, newest first, and the error names them.
    pub fn install_plan(
        &self,
        plan: &InstallPlan,
        dry_run: bool,
        force: bool,
    ) -> Result<BTreeMap<String, bool>> {
        let mut results = BTreeMap::new();
        let mut completed: Vec<CompletedComponent> = Vec::new();
        self.observer.plan_started(plan.components().len());

        for component in plan.components() {
            let id = component.component_id();
            self.observer
                .component_started(id, component.actionable_files());

            if dry_run {
                log::info!(
                    "[dry-run] Would install {} ({} actionable file(s))",
                    id,
                    component.actionable_files()
                );
                self.observer.component_skipped(id, "dry run");
                results.insert(id.to_string(), true);
                continue;
            }

            if !force && component.actionable_files() == 0 && self.is_up_to_date(component) {
                log::info!("Component {id} is up to date");
                self.observer.component_skipped(id, "up to date");
                results.insert(id.to_string(), true);
                continue;
            }

            match self.install_component(plan.profile(), component) {
                Ok(done) => {
                    log::info!("Installed component {id}");
                    self.observer.component_finished(id);
                    results.insert(id.to_string(), true);
                    completed.push(done);
                }
                Err(e) => {
                    log::warn!("Component {id} failed: {e}");
                    let rolled_back = self.rollback(completed);
                    self.observer.rolled_back(&rolled_back);
                    let mut completed_ids = rolled_back;
                    completed_ids.reverse();
                    return Err(install_error::installation_failed(id, completed_ids, e));
                }
            }
        }

        for done in completed {
            if let Err(e) = done.changes.discard() {
                log::warn!("Failed to remove backups: {e}");
            }
        }
        Ok(results)
    }

    /// Receipt carries the plan's manifest hash and every tracked file matches
    fn is_up_to_date(&self, component: &ComponentPlan) -> bool {
        let id = component.component_id();
        let Some(receipt) = self.previous_receipt(id) else {
            return false;
        };
        receipt.manifest_hash == component.manifest_hash()
            && self.receipts.is_current(id, None).unwrap_or(false)
    }

    fn previous_receipt(&self, component_id: &str) -> Option<Receipt> {
        self.receipts.read(component_id).unwrap_or_else(|e| {
            log::warn!("Ignoring receipt for '{component_id}': {e}");
            None
        })
    }

    fn install_component(&self, profile: &str, component: &ComponentPlan) -> Result<CompletedComponent> {
        let id = component.component_id();
        let previous = self.previous_receipt(id);

        let mut variables = self.variables.clone();
        variables.insert("component_id".to_string(), id.to_string());
        variables.insert("profile".to_string(), profile.to_string());
        variables.insert("target_dir".to_string(), self.target_dir.display().to_string());
        let ctx = ActionContext {
            target_dir: &self.target_dir,
            renderer: self.renderer,
            variables,
        };

        let mut transaction = StagingTransaction::begin(&self.target_dir, id)?;
        for action in component.actions() {
            actions::execute(&ctx, &mut transaction, component, action)?;
        }
        transaction.promote()?;
        let changes = transaction.commit()?;

        let written = self
            .build_receipt(profile, component, previous.as_ref())
            .and_then(|receipt| self.receipts.write(&receipt));
        if let Err(e) = written {
            changes.rollback();
            if let Err(discard_err) = changes.discard() {
                log::warn!("Failed to remove backups of {id}: {discard_err}");
            }
            return Err(e);
        }

        Ok(CompletedComponent { changes, previous })
    }

    /// Receipt recording every file with its hash as observed on disk
    fn build_receipt(
        &self,
        profile: &str,
        component: &ComponentPlan,
        previous: Option<&Receipt>,
    ) -> Result<Receipt> {
        let mut files = Vec::with_capacity(component.actions().len());
        for action in component.actions() {
            let observed = hash::hash_file(&self.target_dir.join(action.target_path()))?;
            let record = match (action.kind(), previous.and_then(|r| r.file(action.target_path()))) {
                (ActionKind::Skip, Some(earlier)) => earlier.clone(),
                _ => action.clone(),
            };
            files.push(record.with_target_hash(Some(observed)));
        }

        let mut receipt = Receipt::new(component.component_id(), component.manifest_hash(), files)
            .with_source_root(component.source_root())
            .with_metadata("profile", profile)
            .with_metadata("merge_strategy", component.merge_strategy().to_string())
            .with_metadata("engine_version", env!("CARGO_PKG_VERSION"));
        if let Some(plugin_id) = component.plugin_id() {
            receipt = receipt.with_metadata("plugin_id", plugin_id).with_metadata(
                "plugin_version",
                component
                    .plugin_version()
                    .map_or(Value::Null, Value::from),
            );
        }
        Ok(receipt)
    }

    /// Undo completed components newest first; returns their ids in that order
    fn rollback(&self, completed: Vec<CompletedComponent>) -> Vec<String> {
        let mut rolled_back = Vec::with_capacity(completed.len());
        for done in completed.into_iter().rev() {
            let id = done.changes.component_id().to_string();
            done.changes.rollback();

            let restored = match &done.previous {
                Some(receipt) => self.receipts.write(receipt),
                None => self.receipts.delete(&id).map(|_| ()),
            };
            if let Err(e) = restored {
                log::warn!("Failed to restore receipt of {id}: {e}");
            }
            if let Err(e) = done.changes.discard() {
                log::warn!("Failed to remove backups of {id}: {e}");
            }

            log::info!("Rolled back component {id}");
            rolled_back.push(id);
        }
        rolled_back
    }

    /// Remove the files each component's receipt tracks, then the receipt
    ///
    /// Every id is checked before anything is removed.
    pub fn uninstall(&self, component_ids: &[String]) -> Result<Vec<String>> {
        let mut receipts = Vec::with_capacity(component_ids.len());
        for id in component_ids {
            let receipt = self
                .receipts
                .read(id)?
                .ok_or_else(|| install_error::not_installed(id))?;
            receipts.push(receipt);
        }

        let mut removed = Vec::with_capacity(receipts.len());
        for receipt in receipts {
            for file in &receipt.files {
                self.remove_tracked(file)?;
            }
            self.receipts.delete(&receipt.component_id)?;
            log::info!(
                "Uninstalled component {} ({} file(s))",
                receipt.component_id,
                receipt.files.len()
            );
            removed.push(receipt.component_id);
        }
        Ok(removed)
    }

    fn remove_tracked(&self, file: &FileAction) -> Result<()> {
        let path = self.target_dir.join(file.target_path());
        match std::fs::remove_file(&path) {
            Ok(()) => log::debug!("Removed {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(fs_error::write_failed(&path, e)),
        }
        if let Some(parent) = path.parent() {
            fs_utils::remove_empty_parents(parent, &self.target_dir);
        }
        Ok(())
    }
}
