//! Transaction, installation and orchestration errors

use std::path::Path;

use super::ConfstrapError;

/// Wraps a failure of a single file action
pub fn action_failed(
    kind: impl std::fmt::Display,
    source_path: &Path,
    target_path: &Path,
    reason: impl std::fmt::Display,
) -> ConfstrapError {
    ConfstrapError::ActionFailed {
        kind: kind.to_string(),
        source_path: source_path.display().to_string(),
        target_path: target_path.display().to_string(),
        reason: reason.to_string(),
    }
}

/// Wraps a component failure together with the components rolled back in this run
pub fn installation_failed(
    component: impl Into<String>,
    completed: Vec<String>,
    source: ConfstrapError,
) -> ConfstrapError {
    ConfstrapError::InstallationFailed {
        component: component.into(),
        completed,
        source: Box::new(source),
    }
}

/// Creates a component not installed error
pub fn not_installed(name: impl Into<String>) -> ConfstrapError {
    ConfstrapError::ComponentNotInstalled { name: name.into() }
}

/// Attaches the top-level operation name to an error
pub fn operation_failed(operation: impl Into<String>, source: ConfstrapError) -> ConfstrapError {
    ConfstrapError::OperationFailed {
        operation: operation.into(),
        source: Box::new(source),
    }
}

/// Creates a merge failure
pub fn merge_failed(path: &Path, reason: impl std::fmt::Display) -> ConfstrapError {
    ConfstrapError::MergeFailed {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

/// Creates a template rendering failure
pub fn template_failed(path: impl Into<String>, reason: impl std::fmt::Display) -> ConfstrapError {
    ConfstrapError::TemplateRenderFailed {
        path: path.into(),
        reason: reason.to_string(),
    }
}
