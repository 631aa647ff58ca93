//! Installation plan domain types

use std::collections::HashMap;
use std::path::PathBuf;

use serde_json::{Value, json};

use crate::domain::action::FileAction;
use crate::error::{Result, manifest as manifest_error};
use crate::hash;
use crate::merge::MergeStrategy;
use crate::path_utils;

/// The ordered file actions of one component
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentPlan {
    component_id: String,
    manifest_hash: String,
    plugin_id: Option<String>,
    plugin_version: Option<String>,
    /// Absolute directory the actions' source paths are relative to
    source_root: PathBuf,
    merge_strategy: MergeStrategy,
    actions: Vec<FileAction>,
}

impl ComponentPlan {
    pub fn new(
        component_id: impl Into<String>,
        manifest_hash: impl Into<String>,
        source_root: impl Into<PathBuf>,
        actions: Vec<FileAction>,
    ) -> Result<Self> {
        let component_id = component_id.into();
        let manifest_hash = manifest_hash.into();

        if !path_utils::is_valid_component_id(&component_id) {
            return Err(manifest_error::invalid_plan(format!(
                "invalid component id '{component_id}'"
            )));
        }
        if !hash::is_valid_hash(&manifest_hash) {
            return Err(manifest_error::invalid_plan(format!(
                "manifest hash for '{component_id}' must be {} hex characters",
                hash::HASH_HEX_LEN
            )));
        }

        Ok(Self {
            component_id,
            manifest_hash: manifest_hash.to_ascii_lowercase(),
            plugin_id: None,
            plugin_version: None,
            source_root: source_root.into(),
            merge_strategy: MergeStrategy::default(),
            actions,
        })
    }

    pub fn with_plugin(mut self, id: impl Into<String>, version: Option<String>) -> Self {
        self.plugin_id = Some(id.into());
        self.plugin_version = version;
        self
    }

    pub fn with_merge_strategy(mut self, strategy: MergeStrategy) -> Self {
        self.merge_strategy = strategy;
        self
    }

    pub fn component_id(&self) -> &str {
        &self.component_id
    }

    pub fn manifest_hash(&self) -> &str {
        &self.manifest_hash
    }

    pub fn plugin_id(&self) -> Option<&str> {
        self.plugin_id.as_deref()
    }

    pub fn plugin_version(&self) -> Option<&str> {
        self.plugin_version.as_deref()
    }

    pub fn source_root(&self) -> &std::path::Path {
        &self.source_root
    }

    pub fn merge_strategy(&self) -> MergeStrategy {
        self.merge_strategy
    }

    pub fn actions(&self) -> &[FileAction] {
        &self.actions
    }

    pub fn total_files(&self) -> usize {
        self.actions.len()
    }

    /// Count of actions that are not SKIP
    pub fn actionable_files(&self) -> usize {
        self.actions.iter().filter(|a| a.is_actionable()).count()
    }

    pub fn to_value(&self) -> Value {
        json!({
            "component_id": self.component_id,
            "manifest_hash": self.manifest_hash,
            "plugin_id": self.plugin_id,
            "source_root": path_utils::to_forward_slashes(&self.source_root),
            "merge_strategy": self.merge_strategy,
            "total_files": self.total_files(),
            "actionable_files": self.actionable_files(),
            "actions": self.actions,
        })
    }
}

/// The full plan for one profile
#[derive(Debug, Clone, PartialEq)]
pub struct InstallPlan {
    profile: String,
    components: Vec<ComponentPlan>,
    total_files: usize,
    estimated_size: u64,
}

impl InstallPlan {
    /// `total_files` is derived here so it always matches the components
    pub fn new(profile: impl Into<String>, components: Vec<ComponentPlan>, estimated_size: u64) -> Self {
        let total_files = components.iter().map(ComponentPlan::total_files).sum();
        Self {
            profile: profile.into(),
            components,
            total_files,
            estimated_size,
        }
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    pub fn components(&self) -> &[ComponentPlan] {
        &self.components
    }

    pub fn component(&self, id: &str) -> Option<&ComponentPlan> {
        self.components.iter().find(|c| c.component_id() == id)
    }

    pub fn total_files(&self) -> usize {
        self.total_files
    }

    pub fn actionable_files(&self) -> usize {
        self.components.iter().map(ComponentPlan::actionable_files).sum()
    }

    /// Sum of source sizes of actionable actions, in bytes
    pub fn estimated_size(&self) -> u64 {
        self.estimated_size
    }

    /// Whether two actionable actions target the same destination
    pub fn has_conflicts(&self) -> bool {
        self.first_conflict().is_some()
    }

    /// First destination written by two actionable actions, with both owners
    ///
    /// Returns `(target_path, first_component, second_component)`.
    pub fn first_conflict(&self) -> Option<(&str, &str, &str)> {
        let mut owners: HashMap<&str, &str> = HashMap::new();
        for component in &self.components {
            for action in component.actions().iter().filter(|a| a.is_actionable()) {
                if let Some(owner) = owners.insert(action.target_path(), component.component_id()) {
                    return Some((action.target_path(), owner, component.component_id()));
                }
            }
        }
        None
    }

    /// Structured rendering used for JSON and YAML output
    pub fn to_value(&self) -> Value {
        json!({
            "profile": self.profile,
            "total_files": self.total_files,
            "actionable_files": self.actionable_files(),
            "estimated_size": self.estimated_size,
            "has_conflicts": self.has_conflicts(),
            "components": self
                .components
                .iter()
                .map(ComponentPlan::to_value)
                .collect::<Vec<_>>(),
        })
    }
}
