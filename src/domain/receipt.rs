//! Receipt domain type
//!
//! One receipt per installed component, stored as JSON under
//! `<target>/.confstrap/receipts/<component_id>.json`.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::action::FileAction;

/// Newest receipt schema this engine reads and writes
pub const RECEIPT_SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    1
}

/// Durable record of an installed component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    /// Receipts written before the field existed are version 1
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub component_id: String,
    pub installed_at: DateTime<Utc>,
    pub manifest_hash: String,
    /// Source root the files were installed from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_root: Option<PathBuf>,
    /// Every file the component owns, with final observed hashes
    pub files: Vec<FileAction>,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

impl Receipt {
    pub fn new(
        component_id: impl Into<String>,
        manifest_hash: impl Into<String>,
        files: Vec<FileAction>,
    ) -> Self {
        Self {
            schema_version: RECEIPT_SCHEMA_VERSION,
            component_id: component_id.into(),
            installed_at: Utc::now(),
            manifest_hash: manifest_hash.into(),
            source_root: None,
            files,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_source_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.source_root = Some(root.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// The tracked entry for a target path
    pub fn file(&self, target_path: &str) -> Option<&FileAction> {
        self.files.iter().find(|f| f.target_path() == target_path)
    }

    /// Hash recorded for a target path
    pub fn expected_hash(&self, target_path: &str) -> Option<&str> {
        self.file(target_path).and_then(FileAction::target_hash)
    }

    /// Target paths tracked by this receipt
    pub fn tracked_paths(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(FileAction::target_path)
    }
}

/// Structural problems in a raw receipt document
///
/// Checked on the JSON value so a receipt that would not deserialize can
/// still be described precisely.
pub fn shape_problems(raw: &Value) -> Vec<String> {
    let mut problems = Vec::new();
    let Some(object) = raw.as_object() else {
        problems.push("receipt is not a JSON object".to_string());
        return problems;
    };

    if let Some(version) = object.get("schema_version") {
        match version.as_u64() {
            Some(v) if v <= u64::from(RECEIPT_SCHEMA_VERSION) => {}
            Some(v) => problems.push(format!(
                "schema_version {v} is newer than supported version {RECEIPT_SCHEMA_VERSION}"
            )),
            None => problems.push("schema_version must be an integer".to_string()),
        }
    }

    for field in ["component_id", "installed_at", "manifest_hash"] {
        if !object.get(field).is_some_and(Value::is_string) {
            problems.push(format!("missing or non-string field '{field}'"));
        }
    }

    match object.get("files").and_then(Value::as_array) {
        None => problems.push("missing or non-list field 'files'".to_string()),
        Some(files) => {
            for (index, file) in files.iter().enumerate() {
                if let Err(e) = serde_json::from_value::<FileAction>(file.clone()) {
                    problems.push(format!("files[{index}]: {e}"));
                }
            }
        }
    }

    problems
}
