//! Conflict errors

use super::ConfstrapError;

/// Creates a file pattern conflict
pub fn file(
    pattern: impl Into<String>,
    first: impl Into<String>,
    second: impl Into<String>,
) -> ConfstrapError {
    ConfstrapError::FileConflict {
        pattern: pattern.into(),
        first: first.into(),
        second: second.into(),
    }
}

/// Creates a capability conflict
pub fn capability(
    capability: impl Into<String>,
    first: impl Into<String>,
    second: impl Into<String>,
) -> ConfstrapError {
    ConfstrapError::CapabilityConflict {
        capability: capability.into(),
        first: first.into(),
        second: second.into(),
    }
}
