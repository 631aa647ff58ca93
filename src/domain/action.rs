//! File action domain types
//!
//! A [`FileAction`] is one file-level operation of a component plan, and the
//! same record is stored in receipts with the final observed hash.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, manifest as manifest_error};
use crate::path_utils;

/// What the installer does with a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActionKind {
    Copy,
    Merge,
    Template,
    Skip,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ActionKind::Copy => "COPY",
            ActionKind::Merge => "MERGE",
            ActionKind::Template => "TEMPLATE",
            ActionKind::Skip => "SKIP",
        })
    }
}

/// Why an action is or is not needed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionReason {
    New,
    HashDiff,
    Unchanged,
    Drift,
}

impl fmt::Display for ActionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ActionReason::New => "NEW",
            ActionReason::HashDiff => "HASH_DIFF",
            ActionReason::Unchanged => "UNCHANGED",
            ActionReason::Drift => "DRIFT",
        })
    }
}

/// One file-level operation
///
/// Paths are relative and stored with forward slashes. The only way to build
/// one is [`FileAction::new`] (deserialization goes through it too), so an
/// absolute or escaping path can never reach the installer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawFileAction")]
pub struct FileAction {
    action_kind: ActionKind,
    source_path: String,
    target_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    target_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mode: Option<u32>,
    reason: ActionReason,
}

#[derive(Deserialize)]
struct RawFileAction {
    action_kind: ActionKind,
    source_path: String,
    target_path: String,
    #[serde(default)]
    target_hash: Option<String>,
    #[serde(default)]
    source_hash: Option<String>,
    #[serde(default)]
    mode: Option<u32>,
    reason: ActionReason,
}

impl TryFrom<RawFileAction> for FileAction {
    type Error = crate::error::ConfstrapError;

    fn try_from(raw: RawFileAction) -> Result<Self> {
        let mut action = FileAction::new(
            raw.action_kind,
            &raw.source_path,
            &raw.target_path,
            raw.reason,
        )?;
        action.target_hash = raw.target_hash;
        action.source_hash = raw.source_hash;
        action.mode = raw.mode;
        Ok(action)
    }
}

impl FileAction {
    /// Build an action, rejecting absolute or escaping paths
    pub fn new(
        kind: ActionKind,
        source_path: impl AsRef<Path>,
        target_path: impl AsRef<Path>,
        reason: ActionReason,
    ) -> Result<Self> {
        let source_path = source_path.as_ref();
        let target_path = target_path.as_ref();
        for path in [source_path, target_path] {
            if let Some(violation) = path_utils::relative_path_violation(path) {
                return Err(manifest_error::invalid_action_path(path, violation));
            }
        }

        Ok(Self {
            action_kind: kind,
            source_path: path_utils::to_forward_slashes(source_path),
            target_path: path_utils::to_forward_slashes(target_path),
            target_hash: None,
            source_hash: None,
            mode: None,
            reason,
        })
    }

    pub fn with_target_hash(mut self, hash: Option<String>) -> Self {
        self.target_hash = hash;
        self
    }

    pub fn with_source_hash(mut self, hash: Option<String>) -> Self {
        self.source_hash = hash;
        self
    }

    pub fn with_mode(mut self, mode: Option<u32>) -> Self {
        self.mode = mode;
        self
    }

    pub fn kind(&self) -> ActionKind {
        self.action_kind
    }

    pub fn source_path(&self) -> &str {
        &self.source_path
    }

    pub fn target_path(&self) -> &str {
        &self.target_path
    }

    pub fn target_hash(&self) -> Option<&str> {
        self.target_hash.as_deref()
    }

    pub fn source_hash(&self) -> Option<&str> {
        self.source_hash.as_deref()
    }

    pub fn mode(&self) -> Option<u32> {
        self.mode
    }

    pub fn reason(&self) -> ActionReason {
        self.reason
    }

    /// Whether executing this action touches the filesystem
    pub fn is_actionable(&self) -> bool {
        self.action_kind != ActionKind::Skip
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfstrapError;

    #[test]
    fn test_rejects_absolute_paths() {
        let result = FileAction::new(ActionKind::Copy, "/etc/passwd", "a", ActionReason::New);
        assert!(matches!(
            result,
            Err(ConfstrapError::InvalidActionPath { .. })
        ));

        let result = FileAction::new(ActionKind::Copy, "a", "/abs/b", ActionReason::New);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_parent_components() {
        let result = FileAction::new(ActionKind::Copy, "a", "../b", ActionReason::New);
        assert!(result.unwrap_err().is_validation());
    }

    #[test]
    fn test_serializes_upper_case() {
        let action = FileAction::new(
            ActionKind::Skip,
            "hooks/pre.sh",
            "hooks/pre.sh",
            ActionReason::HashDiff,
        )
        .unwrap()
        .with_mode(Some(0o755));

        let value = serde_json::to_value(&action).unwrap();

        assert_eq!(value["action_kind"], "SKIP");
        assert_eq!(value["reason"], "HASH_DIFF");
        assert_eq!(value["mode"], 493);
        assert!(value.get("target_hash").is_none());
    }

    #[test]
    fn test_deserialize_validates_paths() {
        let value = serde_json::json!({
            "action_kind": "COPY",
            "source_path": "a",
            "target_path": "../../outside",
            "reason": "NEW"
        });

        assert!(serde_json::from_value::<FileAction>(value).is_err());
    }

    #[test]
    fn test_deserialize_roundtrip_keeps_hashes() {
        let action = FileAction::new(ActionKind::Copy, "a.md", "docs/a.md", ActionReason::New)
            .unwrap()
            .with_target_hash(Some("ab".repeat(32)))
            .with_source_hash(Some("cd".repeat(32)));

        let json = serde_json::to_string(&action).unwrap();
        let back: FileAction = serde_json::from_str(&json).unwrap();

        assert_eq!(back, action);
    }

    #[test]
    fn test_is_actionable() {
        let skip = FileAction::new(ActionKind::Skip, "a", "a", ActionReason::Unchanged).unwrap();
        let copy = FileAction::new(ActionKind::Copy, "a", "a", ActionReason::New).unwrap();
        assert!(!skip.is_actionable());
        assert!(copy.is_actionable());
    }
}
