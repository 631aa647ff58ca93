//! Transitive dependency closure
//!
//! Depth-first traversal from the requested ids with an explicit in-progress
//! stack. The stack doubles as the cycle chain reported to the user and as
//! the depth bound.

use std::collections::{BTreeMap, HashSet};

use crate::config::ComponentConfig;
use crate::error::{Result, deps as deps_error};
use crate::resolver::validation::check_cycle;

/// Deepest dependency chain accepted before giving up
pub const MAX_DEPENDENCY_DEPTH: usize = 64;

struct ClosureContext<'a> {
    components: &'a BTreeMap<String, ComponentConfig>,
    /// Fully processed ids
    visited: HashSet<String>,
    /// Current DFS path
    stack: Vec<String>,
    /// Ids in post-order (dependencies first)
    result: Vec<String>,
}

/// Resolve `requested` into its full dependency closure
///
/// `requested_by` names the origin of the top-level ids (for example a
/// profile) in "not found" errors.
pub fn dependency_closure(
    requested: &[String],
    components: &BTreeMap<String, ComponentConfig>,
    requested_by: &str,
) -> Result<Vec<String>> {
    let mut ctx = ClosureContext {
        components,
        visited: HashSet::new(),
        stack: Vec::new(),
        result: Vec::new(),
    };

    for id in requested {
        visit(&mut ctx, id, requested_by)?;
    }
    Ok(ctx.result)
}

fn visit(ctx: &mut ClosureContext, id: &str, required_by: &str) -> Result<()> {
    check_cycle(id, &ctx.stack)?;
    if ctx.visited.contains(id) {
        return Ok(());
    }
    if ctx.stack.len() >= MAX_DEPENDENCY_DEPTH {
        return Err(deps_error::depth_exceeded(id, MAX_DEPENDENCY_DEPTH));
    }

    let component = ctx
        .components
        .get(id)
        .ok_or_else(|| deps_error::not_found(id, required_by))?;

    ctx.stack.push(id.to_string());
    for dependency in &component.dependencies {
        visit(ctx, dependency, id)?;
    }
    ctx.stack.pop();

    ctx.visited.insert(id.to_string());
    ctx.result.push(id.to_string());
    Ok(())
}
