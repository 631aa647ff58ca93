//! Validation utilities for the resolver
//!
//! This module provides:
//! - Circular dependency detection on the DFS stack
//! - File pattern and capability conflict detection
//! - Destination conflicts after source discovery and path mapping

use std::collections::BTreeMap;
use std::path::Path;

use crate::config::ComponentConfig;
use crate::error::{Result, conflict as conflict_error, deps as deps_error};
use crate::path_utils;
use crate::planner::discovery::{destination_for, discover_sources};

/// Check whether `id` is already on the resolution stack
///
/// # Errors
///
/// Returns a circular dependency error naming the chain, `a -> b -> a`.
pub fn check_cycle(id: &str, stack: &[String]) -> Result<()> {
    if let Some(start) = stack.iter().position(|entry| entry == id) {
        let mut chain = stack[start..].to_vec();
        chain.push(id.to_string());
        return Err(deps_error::circular(chain.join(" -> ")));
    }
    Ok(())
}

/// Fail when two components claim the same file pattern or capability
///
/// Patterns are compared in normalized form. A literal path claimed by one
/// component also conflicts with another component's glob matching it.
/// Components are checked in the order given, so the first claimant is named
/// first.
pub fn detect_conflicts<'a>(components: impl IntoIterator<Item = &'a ComponentConfig>) -> Result<()> {
    let mut patterns: BTreeMap<String, &str> = BTreeMap::new();
    let mut capabilities: BTreeMap<&str, &str> = BTreeMap::new();

    for component in components {
        for pattern in &component.file_patterns {
            let normalized = path_utils::normalize_pattern(pattern);
            if let Some((claimed, owner)) = patterns
                .iter()
                .find(|(claimed, owner)| **owner != component.id && patterns_overlap(claimed, &normalized))
            {
                let literal = if is_literal(claimed) { claimed } else { &normalized };
                return Err(conflict_error::file(literal.clone(), *owner, &component.id));
            }
            patterns.entry(normalized).or_insert(&component.id);
        }

        for capability in &component.provides {
            match capabilities.get(capability.as_str()) {
                Some(owner) if *owner != component.id => {
                    return Err(conflict_error::capability(capability, *owner, &component.id));
                }
                Some(_) => {}
                None => {
                    capabilities.insert(capability, &component.id);
                }
            }
        }
    }
    Ok(())
}

/// Identical patterns, or a literal path the other pattern matches
fn patterns_overlap(a: &str, b: &str) -> bool {
    a == b
        || (is_literal(a) && path_utils::matches_glob(b, a))
        || (is_literal(b) && path_utils::matches_glob(a, b))
}

fn is_literal(pattern: &str) -> bool {
    !pattern.contains(['*', '?', '[', '{'])
}

/// Fail when two components would write the same destination
///
/// Sources are discovered and mapped exactly as the planner does, so
/// `target_prefix` and `path_map` collisions are caught before any file is
/// touched.
pub fn detect_destination_conflicts<'a>(
    components: impl IntoIterator<Item = &'a ComponentConfig>,
    template_root: &Path,
) -> Result<()> {
    let mut owners: BTreeMap<String, &str> = BTreeMap::new();

    for component in components {
        let root = component.source_root(template_root);
        for source in discover_sources(&root, &component.file_patterns) {
            let destination =
                path_utils::to_forward_slashes(&destination_for(component, &source.relative));
            match owners.get(&destination) {
                Some(owner) if *owner != component.id => {
                    return Err(conflict_error::file(destination, *owner, &component.id));
                }
                Some(_) => {}
                None => {
                    owners.insert(destination, &component.id);
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfstrapError;
    use tempfile::TempDir;

    fn component(id: &str, patterns: &[&str], provides: &[&str]) -> ComponentConfig {
        let mut component = ComponentConfig::new(id);
        component.file_patterns = patterns.iter().map(|p| (*p).to_string()).collect();
        component.provides = provides.iter().map(|p| (*p).to_string()).collect();
        component
    }

    #[test]
    fn test_check_cycle_chain_starts_at_repeat() {
        let stack = vec!["x".to_string(), "a".to_string(), "b".to_string()];
        let err = check_cycle("a", &stack).unwrap_err();
        assert!(err.to_string().contains("a -> b -> a"));
        assert!(check_cycle("c", &stack).is_ok());
    }

    #[test]
    fn test_same_pattern_conflicts() {
        let a = component("alpha", &["config.yaml"], &[]);
        let b = component("beta", &["./config.yaml"], &[]);

        let err = detect_conflicts([&a, &b]).unwrap_err();

        assert!(matches!(err, ConfstrapError::FileConflict { .. }));
        let message = err.to_string();
        assert!(message.contains("config.yaml"));
        assert!(message.contains("alpha"));
        assert!(message.contains("beta"));
    }

    #[test]
    fn test_capability_conflicts() {
        let a = component("alpha", &["a/*"], &["formatter"]);
        let b = component("beta", &["b/*"], &["formatter"]);

        let err = detect_conflicts([&a, &b]).unwrap_err();

        assert!(err.is_conflict());
        assert!(err.to_string().contains("formatter"));
    }

    #[test]
    fn test_literal_path_inside_glob_conflicts() {
        let a = component("alpha", &["conf/*.yaml"], &[]);
        let b = component("beta", &["conf/config.yaml"], &[]);

        let err = detect_conflicts([&a, &b]).unwrap_err();

        assert!(matches!(err, ConfstrapError::FileConflict { ref pattern, .. } if pattern == "conf/config.yaml"));
        assert!(detect_conflicts([&b, &a]).is_err());
    }

    #[test]
    fn test_disjoint_globs_pass() {
        let a = component("alpha", &["conf/*.yaml"], &[]);
        let b = component("beta", &["conf/*.json", "other/config.yaml"], &[]);
        assert!(detect_conflicts([&a, &b]).is_ok());
    }

    #[test]
    fn test_prefixes_mapping_to_one_destination_conflict() {
        let temp = TempDir::new().unwrap();
        for rel in ["a/config.yaml", "b/config.yaml"] {
            let path = temp.path().join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, "k: v\n").unwrap();
        }
        let mut x = component("x", &["a/*"], &[]);
        x.target_prefix = Some("a".to_string());
        let mut y = component("y", &["b/*"], &[]);
        y.target_prefix = Some("b".to_string());

        assert!(detect_conflicts([&x, &y]).is_ok());
        let err = detect_destination_conflicts([&x, &y], temp.path()).unwrap_err();

        assert!(err.is_conflict());
        let message = err.to_string();
        assert!(message.contains("'config.yaml'"), "{message}");
        assert!(message.contains("'x'") && message.contains("'y'"), "{message}");
    }

    #[test]
    fn test_path_map_collision_conflicts() {
        let temp = TempDir::new().unwrap();
        for rel in ["one/settings.json", "two/settings.json"] {
            let path = temp.path().join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, "{}").unwrap();
        }
        let mut x = component("x", &["one/*"], &[]);
        x.path_map.insert("one".to_string(), ".claude".to_string());
        let mut y = component("y", &["two/*"], &[]);
        y.path_map.insert("two".to_string(), ".claude".to_string());

        assert!(detect_destination_conflicts([&x, &y], temp.path()).is_err());
    }

    #[test]
    fn test_distinct_destinations_pass() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("a")).unwrap();
        std::fs::write(temp.path().join("a/one.md"), "1").unwrap();
        std::fs::write(temp.path().join("a/two.md"), "2").unwrap();
        let x = component("x", &["a/one.md", "a/*.md"], &[]);

        assert!(detect_destination_conflicts([&x], temp.path()).is_ok());
    }

    #[test]
    fn test_distinct_claims_pass() {
        let a = component("alpha", &["a/*", "a/*"], &["x"]);
        let b = component("beta", &["b/*"], &["y"]);
        assert!(detect_conflicts([&a, &b]).is_ok());
    }
}
