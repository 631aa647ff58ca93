//! Doctor findings

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    MissingFile,
    ContentDrift,
    OrphanedFile,
    MalformedReceipt,
    NotInstalled,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DiagnosticKind::MissingFile => "missing_file",
            DiagnosticKind::ContentDrift => "content_drift",
            DiagnosticKind::OrphanedFile => "orphaned_file",
            DiagnosticKind::MalformedReceipt => "malformed_receipt",
            DiagnosticKind::NotInstalled => "not_installed",
        })
    }
}

/// One finding of a doctor pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub component: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub message: String,
    pub repairable: bool,
    #[serde(default)]
    pub details: BTreeMap<String, Value>,
}

impl Diagnostic {
    pub fn new(
        severity: Severity,
        kind: DiagnosticKind,
        component: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            kind,
            component: component.into(),
            path: None,
            message: message.into(),
            repairable: false,
            details: BTreeMap::new(),
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn repairable(mut self) -> Self {
        self.repairable = true;
        self
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Stable identifier: `component:kind[:path]`
    pub fn key(&self) -> String {
        match &self.path {
            Some(path) => format!("{}:{}:{}", self.component, self.kind, path),
            None => format!("{}:{}", self.component, self.kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key() {
        let with_path = Diagnostic::new(Severity::Error, DiagnosticKind::MissingFile, "core", "m")
            .with_path("a/b.md");
        assert_eq!(with_path.key(), "core:missing_file:a/b.md");

        let without = Diagnostic::new(Severity::Info, DiagnosticKind::NotInstalled, "x", "m");
        assert_eq!(without.key(), "x:not_installed");
    }

    #[test]
    fn test_serde_names() {
        let diagnostic =
            Diagnostic::new(Severity::Warning, DiagnosticKind::ContentDrift, "c", "m").repairable();
        let value = serde_json::to_value(&diagnostic).unwrap();

        assert_eq!(value["severity"], "warning");
        assert_eq!(value["kind"], "content_drift");
        assert_eq!(value["repairable"], true);
    }
}
