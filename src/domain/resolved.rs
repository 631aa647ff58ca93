//! Resolver output

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::config::{ComponentConfig, PluginManifest};

/// Components of a profile in install order, with everything planning needs
#[derive(Debug, Clone)]
pub struct ResolvedSpec {
    pub profile: String,
    /// Dependency and priority order
    pub components: Vec<ComponentConfig>,
    /// Loaded plugins keyed by plugin id
    pub plugins: BTreeMap<String, PluginManifest>,
    /// SHA-256 of the canonical base manifest
    pub manifest_digest: String,
    /// Source root for built-in components
    pub template_root: PathBuf,
}

impl ResolvedSpec {
    pub fn component_ids(&self) -> Vec<&str> {
        self.components.iter().map(|c| c.id.as_str()).collect()
    }

    pub fn component(&self, id: &str) -> Option<&ComponentConfig> {
        self.components.iter().find(|c| c.id == id)
    }

    /// Version of the plugin a component came from
    pub fn plugin_version(&self, component: &ComponentConfig) -> Option<&str> {
        component
            .plugin_id()
            .and_then(|id| self.plugins.get(id))
            .map(|plugin| plugin.metadata.version.as_str())
    }
}
