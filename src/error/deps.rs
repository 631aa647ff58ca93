//! Dependency errors

use super::ConfstrapError;

/// Creates a dependency not found error
pub fn not_found(name: impl Into<String>, required_by: impl Into<String>) -> ConfstrapError {
    ConfstrapError::DependencyNotFound {
        name: name.into(),
        required_by: required_by.into(),
    }
}

/// Creates a circular dependency error from a rendered chain
pub fn circular(chain: impl Into<String>) -> ConfstrapError {
    ConfstrapError::CircularDependency {
        chain: chain.into(),
    }
}

/// Creates a depth exceeded error
pub fn depth_exceeded(name: impl Into<String>, max_depth: usize) -> ConfstrapError {
    ConfstrapError::DependencyDepthExceeded {
        name: name.into(),
        max_depth,
    }
}

/// Creates an error for components left over after ordering
pub fn unresolved(components: &[String]) -> ConfstrapError {
    ConfstrapError::UnresolvedDependencies {
        components: components.join(", "),
    }
}
