//! Structured merges of YAML and JSON documents
//!
//! MERGE actions load the existing destination and the incoming source into
//! a common [`serde_json::Value`] tree, combine them with a
//! [`MergeStrategy`], and write the result back in the destination's format.
//!
//! ### Replace
//!
//! The incoming document wins outright.
//!
//! ### Shallow
//!
//! Top-level keys from the incoming document override existing ones; nested
//! objects are replaced, not merged.
//!
//! ```text
//! Existing: {"a": 1, "b": {"x": 1}}
//! Incoming: {"b": {"y": 2}, "c": 3}
//! Result:   {"a": 1, "b": {"y": 2}, "c": 3}
//! ```
//!
//! ### Deep (default)
//!
//! Objects are merged recursively. Arrays are appended without duplicates.
//! Any other incoming value replaces the existing one.
//!
//! ```text
//! Existing: {"a": 1, "b": {"x": 1}}
//! Incoming: {"b": {"y": 2}, "c": 3}
//! Result:   {"a": 1, "b": {"x": 1, "y": 2}, "c": 3}
//! ```

pub mod template;

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, install as install_error};

pub use template::{PlaceholderRenderer, TemplateRenderer};

/// Strategy for combining an existing document with an incoming one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeStrategy {
    /// Incoming document replaces the existing one
    Replace,
    /// Merge top-level keys only
    Shallow,
    /// Recursive merge of nested objects
    #[default]
    Deep,
}

impl MergeStrategy {
    /// Combine two documents
    pub fn merge(self, existing: Value, incoming: Value) -> Value {
        match self {
            MergeStrategy::Replace => incoming,
            MergeStrategy::Shallow => merge_json_shallow(existing, incoming),
            MergeStrategy::Deep => merge_json_deep(existing, incoming),
        }
    }
}

impl std::fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MergeStrategy::Replace => "replace",
            MergeStrategy::Shallow => "shallow",
            MergeStrategy::Deep => "deep",
        };
        f.write_str(name)
    }
}

/// Serialization format of a structured document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Json,
}

impl DocumentFormat {
    /// Format implied by a file extension, `None` for non-structured files
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "yaml" | "yml" => Some(Self::Yaml),
            "json" | "jsonc" => Some(Self::Json),
            _ => None,
        }
    }

    /// Parse text in this format; empty documents read as an empty object
    pub fn parse(self, content: &str, path: &Path) -> Result<Value> {
        if content.trim().is_empty() {
            return Ok(Value::Object(serde_json::Map::new()));
        }

        let value = match self {
            Self::Yaml => serde_yaml::from_str::<Value>(content)
                .map_err(|e| install_error::merge_failed(path, e))?,
            Self::Json => serde_json::from_str::<Value>(&strip_jsonc_comments(content))
                .map_err(|e| install_error::merge_failed(path, e))?,
        };

        Ok(if value.is_null() {
            Value::Object(serde_json::Map::new())
        } else {
            value
        })
    }

    /// Render a value in this format
    pub fn render(self, value: &Value, path: &Path) -> Result<String> {
        match self {
            Self::Yaml => serde_yaml::to_string(value).map_err(|e| install_error::merge_failed(path, e)),
            Self::Json => serde_json::to_string_pretty(value)
                .map(|mut text| {
                    text.push('\n');
                    text
                })
                .map_err(|e| install_error::merge_failed(path, e)),
        }
    }
}

/// Merge a source document into the existing destination content
///
/// The result is rendered in the destination's format. With no existing
/// content the source document is rendered as-is.
pub fn merge_documents(
    existing: Option<&str>,
    destination: &Path,
    incoming: &str,
    source: &Path,
    strategy: MergeStrategy,
) -> Result<String> {
    let destination_format = DocumentFormat::from_path(destination)
        .ok_or_else(|| install_error::merge_failed(destination, "not a YAML or JSON document"))?;
    let source_format = DocumentFormat::from_path(source)
        .ok_or_else(|| install_error::merge_failed(source, "not a YAML or JSON document"))?;

    let incoming = source_format.parse(incoming, source)?;
    let merged = match existing {
        Some(existing) => {
            let existing = destination_format.parse(existing, destination)?;
            strategy.merge(existing, incoming)
        }
        None => incoming,
    };

    destination_format.render(&merged, destination)
}

/// Shallow merge: top-level keys from `incoming` override `existing`
pub fn merge_json_shallow(existing: Value, incoming: Value) -> Value {
    match (existing, incoming) {
        (Value::Object(mut existing_map), Value::Object(incoming_map)) => {
            for (key, value) in incoming_map {
                existing_map.insert(key, value);
            }
            Value::Object(existing_map)
        }
        (_, incoming) => incoming,
    }
}

/// Deep merge: recursively merge nested objects
pub fn merge_json_deep(existing: Value, incoming: Value) -> Value {
    match (existing, incoming) {
        (Value::Object(mut existing_map), Value::Object(incoming_map)) => {
            for (key, incoming_value) in incoming_map {
                let merged_value = match existing_map.remove(&key) {
                    Some(existing_value) => merge_json_deep(existing_value, incoming_value),
                    None => incoming_value,
                };
                existing_map.insert(key, merged_value);
            }
            Value::Object(existing_map)
        }
        (Value::Array(mut existing_items), Value::Array(incoming_items)) => {
            for item in incoming_items {
                if !existing_items.contains(&item) {
                    existing_items.push(item);
                }
            }
            Value::Array(existing_items)
        }
        (_, incoming) => incoming,
    }
}

/// Strip `//` and `/* */` comments from JSONC content, leaving strings intact
pub fn strip_jsonc_comments(content: &str) -> String {
    let mut result = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();
    let mut in_string = false;
    let mut escaped = false;

    while let Some(c) = chars.next() {
        if in_string {
            result.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match (c, chars.peek()) {
            ('/', Some('/')) => {
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        result.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut previous = '\0';
                for skipped in chars.by_ref() {
                    if previous == '*' && skipped == '/' {
                        break;
                    }
                    previous = skipped;
                }
            }
            ('"', _) => {
                in_string = true;
                result.push(c);
            }
            _ => result.push(c),
        }
    }

    result
}
