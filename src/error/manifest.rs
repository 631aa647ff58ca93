//! Manifest and schema validation errors

use std::path::Path;

use super::ConfstrapError;

/// Creates a manifest not found error
pub fn not_found(path: &Path) -> ConfstrapError {
    ConfstrapError::ManifestNotFound {
        path: path.display().to_string(),
    }
}

/// Creates a manifest parse error
pub fn parse_failed(path: impl Into<String>, reason: impl Into<String>) -> ConfstrapError {
    ConfstrapError::ManifestParseFailed {
        path: path.into(),
        reason: reason.into(),
    }
}

/// Creates a structural validation error
pub fn invalid(path: impl Into<String>, message: impl Into<String>) -> ConfstrapError {
    ConfstrapError::ManifestInvalid {
        path: path.into(),
        message: message.into(),
    }
}

/// Creates a profile not found error listing what is defined
pub fn profile_not_found<'a>(
    profile: impl Into<String>,
    available: impl IntoIterator<Item = &'a String>,
) -> ConfstrapError {
    let available: Vec<&str> = available.into_iter().map(String::as_str).collect();
    ConfstrapError::ProfileNotFound {
        profile: profile.into(),
        available: if available.is_empty() {
            "none".to_string()
        } else {
            available.join(", ")
        },
    }
}

/// Creates an invalid action path error
pub fn invalid_action_path(path: &Path, reason: impl Into<String>) -> ConfstrapError {
    ConfstrapError::InvalidActionPath {
        path: path.display().to_string(),
        reason: reason.into(),
    }
}

/// Creates an invalid plan error
pub fn invalid_plan(message: impl Into<String>) -> ConfstrapError {
    ConfstrapError::InvalidPlan {
        message: message.into(),
    }
}
