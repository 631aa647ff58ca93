//! Priority-aware topological sort (Kahn's algorithm)
//!
//! Components whose dependencies are all placed form the ready set. The
//! ready set is ordered by `(priority, id)`, so independent components come
//! out in category order and ties break alphabetically.
//!
//! ```text
//! core (10)      hooks (50) -> core      docs (70)
//!
//! Result: [core, hooks, docs]
//! ```

use std::collections::{BTreeMap, BTreeSet};

use crate::config::ComponentConfig;
use crate::error::{Result, deps as deps_error};

/// Order components so every dependency precedes its dependents
///
/// Dependencies outside the given set are ignored; the closure step has
/// already checked that they exist.
///
/// # Errors
///
/// Returns an unresolved dependencies error naming the components left over
/// when a cycle prevents a complete ordering.
pub fn priority_order(components: Vec<ComponentConfig>) -> Result<Vec<ComponentConfig>> {
    let mut by_id: BTreeMap<String, ComponentConfig> = components
        .into_iter()
        .map(|component| (component.id.clone(), component))
        .collect();

    let order = kahn_order(&by_id)?;
    Ok(order.iter().filter_map(|id| by_id.remove(id)).collect())
}

fn kahn_order(by_id: &BTreeMap<String, ComponentConfig>) -> Result<Vec<String>> {
    let mut in_degree: BTreeMap<&str, usize> = BTreeMap::new();
    let mut dependents: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (id, component) in by_id {
        let mut seen = BTreeSet::new();
        for dependency in &component.dependencies {
            if by_id.contains_key(dependency) && seen.insert(dependency.as_str()) {
                dependents
                    .entry(dependency.as_str())
                    .or_default()
                    .push(id.as_str());
            }
        }
        in_degree.insert(id.as_str(), seen.len());
    }

    let mut ready: BTreeSet<(i64, &str)> = in_degree
        .iter()
        .filter(|(_, degree)| **degree == 0)
        .map(|(id, _)| (by_id[*id].effective_priority(), *id))
        .collect();

    let mut order: Vec<String> = Vec::with_capacity(by_id.len());
    while let Some((_, id)) = ready.pop_first() {
        order.push(id.to_string());

        let Some(waiting) = dependents.get(id) else {
            continue;
        };
        for &dependent in waiting {
            if let Some(degree) = in_degree.get_mut(dependent) {
                *degree -= 1;
                if *degree == 0 {
                    ready.insert((by_id[dependent].effective_priority(), dependent));
                }
            }
        }
    }

    if order.len() < by_id.len() {
        let placed: BTreeSet<&str> = order.iter().map(String::as_str).collect();
        let unresolved: Vec<String> = by_id
            .keys()
            .filter(|id| !placed.contains(id.as_str()))
            .cloned()
            .collect();
        return Err(deps_error::unresolved(&unresolved));
    }
    Ok(order)
}
