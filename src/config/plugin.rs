//! Plugin manifest loading
//!
//! A plugin is a directory under the plugins directory containing a
//! `plugin.yaml` (or `plugin.yml`) manifest and a `files/` tree that its
//! components install from.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::component::{ComponentConfig, PluginOrigin, Profile};
use crate::config::manifest::{Sections, parse_document};
use crate::error::{Result, fs as fs_error, manifest as manifest_error};

/// Manifest file names looked up in each plugin directory, in order
pub const PLUGIN_MANIFEST_FILES: &[&str] = &["plugin.yaml", "plugin.yml"];

/// The `plugin:` metadata block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginMetadata {
    pub name: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawMetadata {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    version: Option<Value>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    author: Option<String>,
}

/// A loaded plugin manifest
#[derive(Debug, Clone)]
pub struct PluginManifest {
    pub metadata: PluginMetadata,
    /// Plugin directory
    pub root: PathBuf,
    pub profiles: BTreeMap<String, Profile>,
    pub components: BTreeMap<String, ComponentConfig>,
}

impl PluginManifest {
    /// Load the manifest of one plugin directory
    ///
    /// Returns `Ok(None)` when the directory has no manifest file.
    pub fn load(dir: &Path) -> Result<Option<Self>> {
        let Some(path) = PLUGIN_MANIFEST_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
        else {
            return Ok(None);
        };

        let content =
            std::fs::read_to_string(&path).map_err(|e| fs_error::read_failed(&path, e))?;
        Self::from_yaml_str(&content, &path, dir).map(Some)
    }

    /// Parse plugin manifest text; `path` is used for error messages
    pub fn from_yaml_str(content: &str, path: &Path, root: &Path) -> Result<Self> {
        let origin = path.display().to_string();
        let document = parse_document(content, &origin)?;

        let metadata = parse_metadata(document.get("plugin"), &origin)?;
        let plugin = PluginOrigin {
            id: metadata.name.clone(),
            root: root.to_path_buf(),
        };
        let sections = Sections::from_document(&document, &origin, false, Some(&plugin))?;

        Ok(Self {
            metadata,
            root: root.to_path_buf(),
            profiles: sections.profiles,
            components: sections.components,
        })
    }

    /// Plugin id, the `plugin.name` field
    pub fn id(&self) -> &str {
        &self.metadata.name
    }

    /// Directory holding the plugin's installable files
    pub fn files_dir(&self) -> PathBuf {
        self.root.join("files")
    }
}

fn parse_metadata(block: Option<&Value>, origin: &str) -> Result<PluginMetadata> {
    let block = block
        .filter(|value| value.is_object())
        .ok_or_else(|| manifest_error::invalid(origin, "missing 'plugin' metadata block"))?;

    let raw = RawMetadata::deserialize(block)
        .map_err(|e| manifest_error::invalid(origin, format!("plugin metadata: {e}")))?;

    let name = raw
        .name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| manifest_error::invalid(origin, "plugin metadata requires 'name'"))?;

    // `version: 1.0` parses as a number
    let version = match raw.version {
        Some(Value::String(version)) if !version.trim().is_empty() => version,
        Some(Value::Number(version)) => version.to_string(),
        _ => {
            return Err(manifest_error::invalid(
                origin,
                format!("plugin '{name}' metadata requires 'version'"),
            ));
        }
    };

    Ok(PluginMetadata {
        name,
        version,
        description: raw.description,
        author: raw.author,
    })
}

/// Load every plugin under `plugins_dir`, visiting directories in sorted order
///
/// A missing plugins directory yields no plugins. Directories without a
/// manifest are skipped.
pub fn discover_plugins(plugins_dir: &Path) -> Result<Vec<PluginManifest>> {
    if !plugins_dir.is_dir() {
        log::debug!("No plugins directory at {}", plugins_dir.display());
        return Ok(Vec::new());
    }

    let mut dirs: Vec<PathBuf> = std::fs::read_dir(plugins_dir)
        .map_err(|e| fs_error::read_failed(plugins_dir, e))?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();

    let mut plugins = Vec::new();
    for dir in dirs {
        match PluginManifest::load(&dir)? {
            Some(plugin) => {
                log::debug!(
                    "Loaded plugin {} {} from {}",
                    plugin.id(),
                    plugin.metadata.version,
                    dir.display()
                );
                plugins.push(plugin);
            }
            None => log::debug!("Skipping {} (no plugin manifest)", dir.display()),
        }
    }
    Ok(plugins)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_plugin(root: &Path, dir: &str, manifest: &str) -> PathBuf {
        let plugin_dir = root.join(dir);
        std::fs::create_dir_all(&plugin_dir).unwrap();
        std::fs::write(plugin_dir.join("plugin.yaml"), manifest).unwrap();
        plugin_dir
    }

    #[test]
    fn test_load_plugin_tags_components() {
        let temp = TempDir::new().unwrap();
        let dir = write_plugin(
            temp.path(),
            "lint",
            "plugin:\n  name: lint\n  version: 1.2.0\ncomponents:\n  lint-hooks:\n    file_patterns: ['hooks/*.sh']\n",
        );

        let plugin = PluginManifest::load(&dir).unwrap().unwrap();

        assert_eq!(plugin.id(), "lint");
        assert_eq!(plugin.files_dir(), dir.join("files"));
        let component = &plugin.components["lint-hooks"];
        assert!(component.is_plugin());
        assert_eq!(component.plugin_id(), Some("lint"));
    }

    #[test]
    fn test_numeric_version_accepted() {
        let temp = TempDir::new().unwrap();
        let dir = write_plugin(temp.path(), "p", "plugin:\n  name: p\n  version: 1.0\n");

        let plugin = PluginManifest::load(&dir).unwrap().unwrap();

        assert_eq!(plugin.metadata.version, "1.0");
    }

    #[test]
    fn test_missing_version_rejected() {
        let temp = TempDir::new().unwrap();
        let dir = write_plugin(temp.path(), "p", "plugin:\n  name: p\n");

        let err = PluginManifest::load(&dir).unwrap_err();

        assert!(err.is_validation());
        assert!(err.to_string().contains("version"));
    }

    #[test]
    fn test_missing_metadata_rejected() {
        let temp = TempDir::new().unwrap();
        let dir = write_plugin(temp.path(), "p", "components: {}\n");

        let err = PluginManifest::load(&dir).unwrap_err();

        assert!(err.to_string().contains("'plugin' metadata"));
    }

    #[test]
    fn test_discover_skips_dirs_without_manifest() {
        let temp = TempDir::new().unwrap();
        write_plugin(temp.path(), "b", "plugin:\n  name: b\n  version: '1'\n");
        write_plugin(temp.path(), "a", "plugin:\n  name: a\n  version: '1'\n");
        std::fs::create_dir_all(temp.path().join("empty")).unwrap();

        let plugins = discover_plugins(temp.path()).unwrap();

        let ids: Vec<&str> = plugins.iter().map(PluginManifest::id).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_discover_missing_dir() {
        let plugins = discover_plugins(Path::new("/nonexistent/plugins")).unwrap();
        assert!(plugins.is_empty());
    }

    #[test]
    fn test_yml_extension() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("y");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("plugin.yml"), "plugin:\n  name: y\n  version: '2'\n").unwrap();

        assert!(PluginManifest::load(&dir).unwrap().is_some());
    }
}
