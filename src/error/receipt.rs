//! Receipt and drift errors

use std::path::Path;

use super::ConfstrapError;

/// Creates an invalid receipt error
pub fn invalid(component: impl Into<String>, reason: impl Into<String>) -> ConfstrapError {
    ConfstrapError::ReceiptInvalid {
        component: component.into(),
        reason: reason.into(),
    }
}

/// Creates a content drift error
pub fn drift(
    component: impl Into<String>,
    path: &Path,
    expected: impl Into<String>,
    actual: impl Into<String>,
) -> ConfstrapError {
    ConfstrapError::ContentDrift {
        component: component.into(),
        path: path.display().to_string(),
        expected: expected.into(),
        actual: actual.into(),
    }
}

/// Creates a tracked-file-missing error
pub fn missing(component: impl Into<String>, path: &Path) -> ConfstrapError {
    ConfstrapError::TrackedFileMissing {
        component: component.into(),
        path: path.display().to_string(),
    }
}

/// Doctor findings that are still open after the run
pub fn unresolved(count: usize) -> ConfstrapError {
    ConfstrapError::ProblemsUnresolved { count }
}
