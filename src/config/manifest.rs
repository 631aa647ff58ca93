//! Manifest loading and shape normalization
//!
//! Two manifest shapes are accepted and normalized here, once, into
//! [`ComponentConfig`] and [`Profile`] values:
//!
//! - enhanced: `components` is a map of `id -> {...}` and each profile is
//!   `name -> {description, components}`
//! - legacy: `components` is a list of `{id, ...}` entries (`name` is accepted
//!   as an alias of `id`) and each profile is a bare list of component ids
//!
//! `depends_on` is accepted as an alias of `dependencies` in both shapes.
//! Nothing downstream of this module branches on the manifest shape.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use crate::config::component::{ComponentConfig, PluginOrigin, Profile, parse_mode};
use crate::error::{Result, fs as fs_error, manifest as manifest_error};
use crate::hash;
use crate::merge::MergeStrategy;
use crate::path_utils;

/// Default manifest file name inside the target directory
pub const MANIFEST_FILE: &str = "confstrap.yaml";

/// A normalized base manifest
#[derive(Debug, Clone)]
pub struct Manifest {
    /// File the manifest was loaded from
    pub path: PathBuf,
    pub profiles: BTreeMap<String, Profile>,
    pub components: BTreeMap<String, ComponentConfig>,
    /// The document exactly as parsed, used for the manifest digest
    pub document: Value,
}

impl Manifest {
    /// Load and validate a manifest from disk
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(manifest_error::not_found(path));
        }
        let content = std::fs::read_to_string(path).map_err(|e| fs_error::read_failed(path, e))?;
        Self::from_yaml_str(&content, path)
    }

    /// Parse a manifest from YAML text; `path` is used for error messages
    pub fn from_yaml_str(content: &str, path: &Path) -> Result<Self> {
        let origin = path.display().to_string();
        let document = parse_document(content, &origin)?;
        let sections = Sections::from_document(&document, &origin, true, None)?;

        log::debug!(
            "Loaded manifest {} ({} profiles, {} components)",
            origin,
            sections.profiles.len(),
            sections.components.len()
        );

        Ok(Self {
            path: path.to_path_buf(),
            profiles: sections.profiles,
            components: sections.components,
            document,
        })
    }

    /// SHA-256 over the canonical JSON form of the parsed document
    pub fn digest(&self) -> String {
        hash::digest_value(&self.document)
    }

    /// Directory containing the manifest file
    pub fn base_dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }
}

/// Parse YAML text into a JSON value tree, requiring a top-level mapping
pub(crate) fn parse_document(content: &str, origin: &str) -> Result<Value> {
    let document: Value = serde_yaml::from_str(content)
        .map_err(|e| manifest_error::parse_failed(origin, e.to_string()))?;

    if !document.is_object() {
        return Err(manifest_error::invalid(
            origin,
            "top level must be a mapping",
        ));
    }
    Ok(document)
}

/// The `profiles` and `components` sections of a base or plugin manifest
#[derive(Debug, Default)]
pub(crate) struct Sections {
    pub profiles: BTreeMap<String, Profile>,
    pub components: BTreeMap<String, ComponentConfig>,
}

impl Sections {
    /// Normalize both sections; `required` rejects a document missing either
    pub(crate) fn from_document(
        document: &Value,
        origin: &str,
        required: bool,
        plugin: Option<&PluginOrigin>,
    ) -> Result<Self> {
        let components = match section(document, "components") {
            Some(value) => {
                let shape = ComponentsShape::parse(value, origin)?;
                normalize_components(shape, origin, plugin)?
            }
            None if required => {
                return Err(manifest_error::invalid(
                    origin,
                    "missing 'components' section",
                ));
            }
            None => BTreeMap::new(),
        };

        let profiles = match section(document, "profiles") {
            Some(value) => normalize_profiles(value, origin)?,
            None if required => {
                return Err(manifest_error::invalid(origin, "missing 'profiles' section"));
            }
            None => BTreeMap::new(),
        };

        Ok(Self {
            profiles,
            components,
        })
    }
}

fn section<'a>(document: &'a Value, name: &str) -> Option<&'a Value> {
    document.get(name).filter(|value| !value.is_null())
}

/// Accepted shapes of the `components` section
enum ComponentsShape {
    Keyed(Vec<(String, RawComponent)>),
    Listed(Vec<RawComponent>),
}

impl ComponentsShape {
    fn parse(value: &Value, origin: &str) -> Result<Self> {
        match value {
            Value::Object(map) => map
                .iter()
                .map(|(id, body)| {
                    let raw = if body.is_null() {
                        RawComponent::default()
                    } else {
                        RawComponent::deserialize(body).map_err(|e| {
                            manifest_error::invalid(origin, format!("component '{id}': {e}"))
                        })?
                    };
                    Ok((id.clone(), raw))
                })
                .collect::<Result<Vec<_>>>()
                .map(Self::Keyed),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(index, body)| {
                    RawComponent::deserialize(body).map_err(|e| {
                        manifest_error::invalid(origin, format!("components[{index}]: {e}"))
                    })
                })
                .collect::<Result<Vec<_>>>()
                .map(Self::Listed),
            other => Err(manifest_error::invalid(
                origin,
                format!(
                    "'components' must be a mapping or a list, found {}",
                    type_name(other)
                ),
            )),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawComponent {
    #[serde(default, alias = "name")]
    id: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    file_patterns: Vec<String>,
    #[serde(default, alias = "depends_on")]
    dependencies: Vec<String>,
    #[serde(default)]
    priority: Option<i64>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    provides: Vec<String>,
    #[serde(default)]
    target_prefix: Option<String>,
    #[serde(default)]
    path_map: BTreeMap<String, String>,
    #[serde(default)]
    modes: BTreeMap<String, RawMode>,
    #[serde(default)]
    merge_strategy: Option<MergeStrategy>,
}

/// Modes may be written quoted (`"0755"`) or as bare numbers (`755`)
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawMode {
    Number(u64),
    Text(String),
}

impl RawMode {
    fn as_text(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawProfile {
    Listed(Vec<String>),
    Detailed {
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        components: Vec<String>,
    },
}

fn normalize_components(
    shape: ComponentsShape,
    origin: &str,
    plugin: Option<&PluginOrigin>,
) -> Result<BTreeMap<String, ComponentConfig>> {
    let entries: Vec<(String, RawComponent)> = match shape {
        ComponentsShape::Keyed(entries) => entries
            .into_iter()
            .map(|(key, raw)| match raw.id.as_deref() {
                Some(inner) if inner != key => Err(manifest_error::invalid(
                    origin,
                    format!("component '{key}' declares a different id '{inner}'"),
                )),
                _ => Ok((key, raw)),
            })
            .collect::<Result<_>>()?,
        ComponentsShape::Listed(items) => items
            .into_iter()
            .enumerate()
            .map(|(index, raw)| match raw.id.clone() {
                Some(id) => Ok((id, raw)),
                None => Err(manifest_error::invalid(
                    origin,
                    format!("components[{index}] has no 'id'"),
                )),
            })
            .collect::<Result<_>>()?,
    };

    let mut components = BTreeMap::new();
    for (id, raw) in entries {
        let component = normalize_component(id, raw, origin, plugin)?;
        if components.contains_key(&component.id) {
            return Err(manifest_error::invalid(
                origin,
                format!("component '{}' is defined more than once", component.id),
            ));
        }
        components.insert(component.id.clone(), component);
    }
    Ok(components)
}

fn normalize_component(
    id: String,
    raw: RawComponent,
    origin: &str,
    plugin: Option<&PluginOrigin>,
) -> Result<ComponentConfig> {
    let invalid = |message: String| manifest_error::invalid(origin, message);

    if !path_utils::is_valid_component_id(&id) {
        return Err(invalid(format!(
            "invalid component id '{id}' (use letters, digits, '-' and '_')"
        )));
    }

    let mut file_patterns = Vec::with_capacity(raw.file_patterns.len());
    for pattern in &raw.file_patterns {
        let normalized = path_utils::normalize_pattern(pattern);
        if normalized.is_empty() || !path_utils::is_valid_glob(&normalized) {
            return Err(invalid(format!(
                "component '{id}' has an invalid file pattern '{pattern}'"
            )));
        }
        file_patterns.push(normalized);
    }

    for dependency in &raw.dependencies {
        if !path_utils::is_valid_component_id(dependency) {
            return Err(invalid(format!(
                "component '{id}' depends on an invalid id '{dependency}'"
            )));
        }
    }

    let target_prefix = raw
        .target_prefix
        .as_deref()
        .map(|prefix| path_utils::normalize_pattern(prefix).trim_end_matches('/').to_string())
        .filter(|prefix| !prefix.is_empty());

    let mut path_map = BTreeMap::new();
    for (from, to) in &raw.path_map {
        let from = path_utils::normalize_pattern(from).trim_end_matches('/').to_string();
        let to = path_utils::normalize_pattern(to).trim_end_matches('/').to_string();
        for side in [&from, &to] {
            if let Some(reason) = path_utils::relative_path_violation(Path::new(side)) {
                return Err(invalid(format!(
                    "component '{id}' path_map entry '{side}': {reason}"
                )));
            }
        }
        path_map.insert(from, to);
    }

    let mut modes = BTreeMap::new();
    for (suffix, mode) in &raw.modes {
        let text = mode.as_text();
        let bits = parse_mode(&text).ok_or_else(|| {
            invalid(format!(
                "component '{id}' has an invalid mode '{text}' for '{suffix}'"
            ))
        })?;
        modes.insert(suffix.clone(), format!("{bits:04o}"));
    }

    Ok(ComponentConfig {
        id,
        description: raw.description,
        file_patterns,
        dependencies: raw.dependencies,
        priority: raw.priority,
        category: raw.category,
        provides: raw.provides,
        target_prefix,
        path_map,
        modes,
        merge_strategy: raw.merge_strategy,
        plugin: plugin.cloned(),
    })
}

fn normalize_profiles(value: &Value, origin: &str) -> Result<BTreeMap<String, Profile>> {
    let Value::Object(map) = value else {
        return Err(manifest_error::invalid(
            origin,
            format!("'profiles' must be a mapping, found {}", type_name(value)),
        ));
    };

    let mut profiles = BTreeMap::new();
    for (name, body) in map {
        let raw = RawProfile::deserialize(body).map_err(|_| {
            manifest_error::invalid(
                origin,
                format!(
                    "profile '{name}' must be a list of component ids or a mapping with 'components'"
                ),
            )
        })?;

        let (description, components) = match raw {
            RawProfile::Listed(components) => (None, components),
            RawProfile::Detailed {
                description,
                components,
            } => (description, components),
        };

        if let Some(bad) = components
            .iter()
            .find(|id| !path_utils::is_valid_component_id(id))
        {
            return Err(manifest_error::invalid(
                origin,
                format!("profile '{name}' lists an invalid component id '{bad}'"),
            ));
        }

        profiles.insert(
            name.clone(),
            Profile {
                name: name.clone(),
                description,
                components,
            },
        );
    }
    Ok(profiles)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}
