//! Canonical component and profile definitions
//!
//! These are the normalized, in-memory shapes the resolver and planner work
//! with. Every accepted manifest shape is converted into them by
//! [`crate::config::manifest`] before resolution begins.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::hash;
use crate::merge::MergeStrategy;

/// Priority for components whose category is not in the table
pub const DEFAULT_PRIORITY: i64 = 100;

/// Category ordering used to break ties between independent components
const CATEGORY_PRIORITIES: &[(&str, i64)] = &[
    ("core", 10),
    ("settings", 20),
    ("agents", 30),
    ("commands", 40),
    ("hooks", 50),
    ("workflows", 60),
    ("docs", 70),
];

/// Where a plugin-contributed component came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginOrigin {
    /// Plugin id (the `plugin.name` of its manifest)
    pub id: String,
    /// Plugin directory containing `plugin.yaml`
    pub root: PathBuf,
}

impl PluginOrigin {
    /// Directory holding the plugin's installable files
    pub fn files_dir(&self) -> PathBuf {
        self.root.join("files")
    }
}

/// A named, independently installable unit of configuration files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentConfig {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Glob patterns selecting files under the component's source root
    #[serde(default)]
    pub file_patterns: Vec<String>,

    #[serde(default)]
    pub dependencies: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Capability tags; no two resolved components may share one
    #[serde(default)]
    pub provides: Vec<String>,

    /// Prefix stripped from source paths when computing destinations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_prefix: Option<String>,

    /// Destination remapping: source-relative path or directory -> destination
    #[serde(default)]
    pub path_map: BTreeMap<String, String>,

    /// Destination suffix -> octal permission string
    #[serde(default)]
    pub modes: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_strategy: Option<MergeStrategy>,

    /// Set for plugin components; never part of the component hash
    #[serde(skip)]
    pub plugin: Option<PluginOrigin>,
}

impl ComponentConfig {
    /// Create an empty component with the given id
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: None,
            file_patterns: Vec::new(),
            dependencies: Vec::new(),
            priority: None,
            category: None,
            provides: Vec::new(),
            target_prefix: None,
            path_map: BTreeMap::new(),
            modes: BTreeMap::new(),
            merge_strategy: None,
            plugin: None,
        }
    }

    /// Whether this component was contributed by a plugin
    pub fn is_plugin(&self) -> bool {
        self.plugin.is_some()
    }

    pub fn plugin_id(&self) -> Option<&str> {
        self.plugin.as_ref().map(|p| p.id.as_str())
    }

    /// Explicit priority, else the category table, else [`DEFAULT_PRIORITY`]
    pub fn effective_priority(&self) -> i64 {
        self.priority.unwrap_or_else(|| {
            self.category
                .as_deref()
                .and_then(|category| {
                    CATEGORY_PRIORITIES
                        .iter()
                        .find(|(name, _)| name.eq_ignore_ascii_case(category))
                        .map(|(_, priority)| *priority)
                })
                .unwrap_or(DEFAULT_PRIORITY)
        })
    }

    /// Root directory the component's file patterns are expanded against
    pub fn source_root(&self, template_root: &Path) -> PathBuf {
        self.plugin
            .as_ref()
            .map_or_else(|| template_root.to_path_buf(), PluginOrigin::files_dir)
    }

    /// SHA-256 of the canonical JSON form of this configuration
    pub fn config_hash(&self) -> String {
        let value = serde_json::to_value(self).unwrap_or(serde_json::Value::Null);
        hash::digest_value(&value)
    }

    /// Permission bits configured for a destination path, longest suffix wins
    pub fn mode_for(&self, destination: &str) -> Option<u32> {
        self.modes
            .iter()
            .filter(|(suffix, _)| destination.ends_with(suffix.as_str()))
            .max_by_key(|(suffix, _)| suffix.len())
            .and_then(|(_, mode)| parse_mode(mode))
    }
}

/// Parse an octal permission string such as `0755`, `755` or `0o644`
pub fn parse_mode(text: &str) -> Option<u32> {
    let digits = text.trim().trim_start_matches("0o");
    let mode = u32::from_str_radix(digits, 8).ok()?;
    (mode <= 0o7777).then_some(mode)
}

/// A named list of components installed together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub components: Vec<String>,
}
