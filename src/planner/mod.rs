//! Installation planning
//!
//! Turns a [`ResolvedSpec`] into an [`InstallPlan`] by comparing every
//! source file against the target directory and the component's receipt.
//! Planning only reads; running it twice over the same inputs yields the same
//! plan.
//!
//! Reason rules, first match wins:
//!
//! | Condition                                             | Reason      |
//! |-------------------------------------------------------|-------------|
//! | force                                                 | `HASH_DIFF` |
//! | destination missing                                   | `NEW`       |
//! | receipt current for the path and source unchanged     | `UNCHANGED` |
//! | source hash equals destination hash                   | `UNCHANGED` |
//! | destination differs from the receipt's recorded hash  | `DRIFT`     |
//! | otherwise                                             | `HASH_DIFF` |
//!
//! `UNCHANGED` actions become `SKIP`.

pub mod discovery;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::common::fs as fs_utils;
use crate::config::ComponentConfig;
use crate::domain::{
    ActionKind, ActionReason, ComponentPlan, FileAction, InstallPlan, Receipt, ResolvedSpec,
};
use crate::error::Result;
use crate::hash;
use crate::path_utils;
use crate::receipts::ReceiptStore;

pub use discovery::{SourceFile, destination_for, discover_sources};

/// Permission bits used for sources with an executable bit
const EXECUTABLE_MODE: u32 = 0o755;

/// Builds install plans against one target directory
pub struct Planner<'a> {
    target_dir: PathBuf,
    receipts: &'a ReceiptStore,
    force: bool,
}

impl<'a> Planner<'a> {
    pub fn new(target_dir: &Path, receipts: &'a ReceiptStore) -> Self {
        Self {
            target_dir: target_dir.to_path_buf(),
            receipts,
            force: false,
        }
    }

    /// Plan every file as `HASH_DIFF`, even unchanged ones
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn plan(&self, spec: &ResolvedSpec) -> Result<InstallPlan> {
        let mut components = Vec::with_capacity(spec.components.len());
        let mut estimated_size = 0u64;

        for component in &spec.components {
            let (plan, size) = self.plan_component(spec, component)?;
            estimated_size += size;
            components.push(plan);
        }

        let plan = InstallPlan::new(&spec.profile, components, estimated_size);
        log::info!(
            "Planned {} file(s), {} actionable, for profile '{}'",
            plan.total_files(),
            plan.actionable_files(),
            plan.profile()
        );
        Ok(plan)
    }

    fn plan_component(
        &self,
        spec: &ResolvedSpec,
        component: &ComponentConfig,
    ) -> Result<(ComponentPlan, u64)> {
        let source_root = component.source_root(&spec.template_root);
        let receipt = self.previous_receipt(&component.id);
        let sources = discover_sources(&source_root, &component.file_patterns);
        if sources.is_empty() {
            log::debug!(
                "Component '{}' matched no files under {}",
                component.id,
                source_root.display()
            );
        }

        let mut actions = Vec::with_capacity(sources.len());
        let mut size = 0u64;
        for source in &sources {
            let action = self.plan_file(component, source, receipt.as_ref())?;
            if action.is_actionable() {
                size += std::fs::metadata(&source.absolute).map_or(0, |m| m.len());
            }
            log::debug!(
                "{}: {} {} -> {} ({})",
                component.id,
                action.kind(),
                action.source_path(),
                action.target_path(),
                action.reason()
            );
            actions.push(action);
        }

        let mut plan = ComponentPlan::new(&component.id, component.config_hash(), source_root, actions)?
            .with_merge_strategy(component.merge_strategy.unwrap_or_default());
        if let Some(plugin_id) = component.plugin_id() {
            plan = plan.with_plugin(plugin_id, spec.plugin_version(component).map(str::to_string));
        }
        Ok((plan, size))
    }

    /// The component's receipt; an unreadable one counts as absent
    fn previous_receipt(&self, component_id: &str) -> Option<Receipt> {
        match self.receipts.read(component_id) {
            Ok(receipt) => receipt,
            Err(e) => {
                log::warn!("Ignoring receipt for '{component_id}': {e}");
                None
            }
        }
    }

    fn plan_file(
        &self,
        component: &ComponentConfig,
        source: &SourceFile,
        receipt: Option<&Receipt>,
    ) -> Result<FileAction> {
        let destination = destination_for(component, &source.relative);
        let target_path = path_utils::to_forward_slashes(&destination);
        let absolute_target = self.target_dir.join(&destination);

        let source_hash = hash::hash_file(&source.absolute)?;
        let target_hash = hash::hash_file_if_exists(&absolute_target)?;

        let kind = if path_utils::template_suffix(Path::new(&source.relative)).is_some() {
            ActionKind::Template
        } else if target_hash.is_some()
            && path_utils::is_structured(Path::new(&source.relative))
            && path_utils::is_structured(&destination)
        {
            ActionKind::Merge
        } else {
            ActionKind::Copy
        };

        let reason = self.reason(&target_path, &source_hash, target_hash.as_deref(), receipt);
        let (kind, recorded_hash) = match (reason, kind) {
            (ActionReason::Unchanged, _) => (ActionKind::Skip, target_hash),
            (_, ActionKind::Copy) => (ActionKind::Copy, Some(source_hash.clone())),
            (_, kind) => (kind, None),
        };

        let mode = component.mode_for(&target_path).or_else(|| {
            fs_utils::is_executable(&source.absolute).then_some(EXECUTABLE_MODE)
        });

        Ok(FileAction::new(kind, &source.relative, &destination, reason)?
            .with_target_hash(recorded_hash)
            .with_source_hash(Some(source_hash))
            .with_mode(mode))
    }

    fn reason(
        &self,
        target_path: &str,
        source_hash: &str,
        target_hash: Option<&str>,
        receipt: Option<&Receipt>,
    ) -> ActionReason {
        if self.force {
            return ActionReason::HashDiff;
        }
        let Some(target_hash) = target_hash else {
            return ActionReason::New;
        };

        let recorded = receipt.and_then(|r| r.file(target_path));
        let expected = recorded.and_then(FileAction::target_hash);

        let receipt_current = expected.is_some_and(|e| hash::verify_hash(e, target_hash));
        let source_unchanged = recorded
            .and_then(FileAction::source_hash)
            .is_none_or(|recorded| hash::verify_hash(recorded, source_hash));
        if receipt_current && source_unchanged {
            return ActionReason::Unchanged;
        }
        if hash::verify_hash(source_hash, target_hash) {
            return ActionReason::Unchanged;
        }
        if expected.is_some_and(|e| !hash::verify_hash(e, target_hash)) {
            return ActionReason::Drift;
        }
        ActionReason::HashDiff
    }
}

/// Every destination the given components would write, forward-slash form
pub fn declared_paths<'c>(
    components: impl IntoIterator<Item = &'c ComponentConfig>,
    template_root: &Path,
) -> BTreeSet<String> {
    components
        .into_iter()
        .flat_map(|component| {
            let root = component.source_root(template_root);
            discover_sources(&root, &component.file_patterns)
                .into_iter()
                .map(move |source| {
                    path_utils::to_forward_slashes(&destination_for(component, &source.relative))
                })
        })
        .collect()
}
