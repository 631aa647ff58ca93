//! Effective component and profile namespace
//!
//! The base manifest is authoritative: a plugin can add components and
//! profiles but never replace one the base defines. Among plugins, visited in
//! sorted directory order, a later plugin replaces an earlier one's entry.

use std::collections::BTreeMap;

use crate::config::{ComponentConfig, Manifest, PluginManifest, Profile};

/// Base manifest plus everything plugins contribute
#[derive(Debug, Clone)]
pub struct Namespace {
    pub manifest: Manifest,
    pub components: BTreeMap<String, ComponentConfig>,
    pub profiles: BTreeMap<String, Profile>,
    pub plugins: BTreeMap<String, PluginManifest>,
}

impl Namespace {
    pub fn build(manifest: Manifest, plugins: Vec<PluginManifest>) -> Self {
        let mut components = manifest.components.clone();
        let mut profiles = manifest.profiles.clone();
        let mut plugin_map: BTreeMap<String, PluginManifest> = BTreeMap::new();

        for plugin in plugins {
            let plugin_id = plugin.id().to_string();

            for (id, component) in &plugin.components {
                if manifest.components.contains_key(id) {
                    log::warn!(
                        "Plugin '{plugin_id}' component '{id}' ignored: defined by the base manifest"
                    );
                    continue;
                }
                if let Some(previous) = components.insert(id.clone(), component.clone()) {
                    log::warn!(
                        "Plugin '{}' component '{}' replaces the one from plugin '{}'",
                        plugin_id,
                        id,
                        previous.plugin_id().unwrap_or("unknown")
                    );
                }
            }

            for (name, profile) in &plugin.profiles {
                if manifest.profiles.contains_key(name) {
                    log::warn!(
                        "Plugin '{plugin_id}' profile '{name}' ignored: defined by the base manifest"
                    );
                    continue;
                }
                if profiles.insert(name.clone(), profile.clone()).is_some() {
                    log::warn!("Plugin '{plugin_id}' profile '{name}' replaces an earlier plugin's");
                }
            }

            if plugin_map.contains_key(&plugin_id) {
                log::warn!("Plugin id '{plugin_id}' is declared more than once, the last one wins");
            }
            plugin_map.insert(plugin_id, plugin);
        }

        Self {
            manifest,
            components,
            profiles,
            plugins: plugin_map,
        }
    }

    pub fn profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }
}
