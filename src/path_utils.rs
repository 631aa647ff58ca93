//! Cross-platform path utilities for confstrap
//!
//! All manifest patterns, plan paths and receipt paths are compared in
//! forward-slash form so plans and receipts are identical across platforms.

use std::path::{Component, Path, PathBuf};

use wax::{CandidatePath, Glob, Pattern};

/// Extensions that mark a source file as a template
pub const TEMPLATE_SUFFIXES: &[&str] = &[".j2", ".tmpl"];

/// Extensions treated as structured (mergeable) documents
const STRUCTURED_EXTENSIONS: &[&str] = &["yaml", "yml", "json", "jsonc"];

/// Convert a path to a forward-slash string
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use confstrap::path_utils::to_forward_slashes;
///
/// assert_eq!(to_forward_slashes(Path::new("a\\b/c.txt")), "a/b/c.txt");
/// ```
pub fn to_forward_slashes(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Normalize a manifest file pattern for comparison
///
/// Converts backslashes and strips any leading `./`.
pub fn normalize_pattern(pattern: &str) -> String {
    let mut normalized = pattern.trim().replace('\\', "/");
    while let Some(rest) = normalized.strip_prefix("./") {
        normalized = rest.to_string();
    }
    normalized
}

/// Why a path cannot be used as a relative plan path, if it cannot
pub fn relative_path_violation(path: &Path) -> Option<&'static str> {
    if path.as_os_str().is_empty() {
        return Some("path is empty");
    }
    if path.is_absolute() || path.has_root() {
        return Some("path must be relative");
    }
    if path
        .components()
        .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
    {
        return Some("path must not escape its root");
    }
    None
}

/// Check if a glob pattern matches a forward-slash relative path
///
/// Uses wax for platform-independent glob matching; an invalid pattern
/// falls back to exact comparison.
pub fn matches_glob(pattern: &str, file_path: &str) -> bool {
    let normalized_path = to_forward_slashes(Path::new(file_path));
    let candidate = CandidatePath::from(normalized_path.as_str());

    match Glob::new(pattern) {
        Ok(glob) => glob.matched(&candidate).is_some(),
        Err(_) => pattern == normalized_path,
    }
}

/// Whether a pattern is a valid glob
pub fn is_valid_glob(pattern: &str) -> bool {
    Glob::new(pattern).is_ok()
}

/// Component ids are non-empty and limited to ASCII alphanumerics, `-` and `_`
pub fn is_valid_component_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// The template suffix of a path, if it has one
pub fn template_suffix(path: &Path) -> Option<&'static str> {
    let name = path.file_name()?.to_str()?;
    TEMPLATE_SUFFIXES
        .iter()
        .copied()
        .find(|suffix| name.len() > suffix.len() && name.ends_with(suffix))
}

/// Strip a template suffix (`settings.json.j2` -> `settings.json`)
pub fn strip_template_suffix(path: &Path) -> PathBuf {
    match (template_suffix(path), path.to_str()) {
        (Some(suffix), Some(text)) => PathBuf::from(&text[..text.len() - suffix.len()]),
        _ => path.to_path_buf(),
    }
}

/// Whether the path names a YAML or JSON document
pub fn is_structured(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| STRUCTURED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}
