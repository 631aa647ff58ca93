//! Source discovery and destination mapping
//!
//! This module handles:
//! - Walking a component's source root for files matching its patterns
//! - Mapping a source-relative path to its destination under the target

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::ComponentConfig;
use crate::path_utils;

/// A file selected by a component's patterns
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SourceFile {
    /// Forward-slash path relative to the source root
    pub relative: String,
    pub absolute: PathBuf,
}

/// Files under `root` matching any of `patterns`, sorted and de-duplicated
///
/// A missing root yields no files.
pub fn discover_sources(root: &Path, patterns: &[String]) -> Vec<SourceFile> {
    if !root.is_dir() || patterns.is_empty() {
        return Vec::new();
    }

    let mut files: Vec<SourceFile> = WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let relative = entry.path().strip_prefix(root).ok()?;
            let relative = path_utils::to_forward_slashes(relative);
            patterns
                .iter()
                .any(|pattern| path_utils::matches_glob(pattern, &relative))
                .then(|| SourceFile {
                    relative,
                    absolute: entry.path().to_path_buf(),
                })
        })
        .collect();

    files.sort();
    files.dedup();
    files
}

/// Destination of a source-relative path
///
/// `target_prefix` is stripped first, then the longest matching `path_map`
/// key is replaced, and finally a template suffix is dropped.
pub fn destination_for(component: &ComponentConfig, relative: &str) -> PathBuf {
    let mut path = relative.to_string();

    if let Some(prefix) = component.target_prefix.as_deref().filter(|p| !p.is_empty()) {
        if let Some(rest) = path.strip_prefix(prefix).and_then(|r| r.strip_prefix('/')) {
            path = rest.to_string();
        }
    }

    if let Some(mapped) = apply_path_map(&component.path_map, &path) {
        path = mapped;
    }

    path_utils::strip_template_suffix(Path::new(&path))
}

fn apply_path_map(path_map: &BTreeMap<String, String>, path: &str) -> Option<String> {
    let (key, value) = path_map
        .iter()
        .map(|(key, value)| (key.trim_end_matches('/'), value.trim_end_matches('/')))
        .filter(|(key, _)| {
            !key.is_empty()
                && (path == *key
                    || path
                        .strip_prefix(*key)
                        .is_some_and(|rest| rest.starts_with('/')))
        })
        .max_by_key(|(key, _)| key.len())?;

    let rest = &path[key.len()..];
    if value.is_empty() {
        Some(rest.trim_start_matches('/').to_string())
    } else {
        Some(format!("{value}{rest}"))
    }
}
