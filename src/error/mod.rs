//! Error types and handling for confstrap
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//!
//! This module is organized into sub-modules by error domain:
//! - [`manifest`]: Manifest and schema validation errors
//! - [`deps`]: Dependency errors
//! - [`conflict`]: File pattern and capability conflicts
//! - [`install`]: Transaction, installation and orchestration errors
//! - [`receipt`]: Receipt and drift errors
//! - [`fs`]: File system errors

pub mod conflict;
pub mod deps;
pub mod fs;
pub mod install;
pub mod manifest;
pub mod receipt;

use miette::Diagnostic;
use thiserror::Error;

/// Main error type for confstrap operations
#[derive(Error, Diagnostic, Debug)]
pub enum ConfstrapError {
    // Manifest / validation errors
    #[error("Manifest not found: {path}")]
    #[diagnostic(
        code(confstrap::manifest::not_found),
        help("Pass --manifest or create confstrap.yaml in the target directory")
    )]
    ManifestNotFound { path: String },

    #[error("Failed to parse manifest {path}: {reason}")]
    #[diagnostic(code(confstrap::manifest::parse_failed))]
    ManifestParseFailed { path: String, reason: String },

    #[error("Invalid manifest {path}: {message}")]
    #[diagnostic(code(confstrap::manifest::invalid))]
    ManifestInvalid { path: String, message: String },

    #[error("Profile '{profile}' not found (available: {available})")]
    #[diagnostic(
        code(confstrap::manifest::profile_not_found),
        help("Run 'confstrap list --profiles' to see the defined profiles")
    )]
    ProfileNotFound { profile: String, available: String },

    #[error("Invalid file action path '{path}': {reason}")]
    #[diagnostic(code(confstrap::plan::invalid_path))]
    InvalidActionPath { path: String, reason: String },

    #[error("Invalid plan: {message}")]
    #[diagnostic(code(confstrap::plan::invalid))]
    InvalidPlan { message: String },

    #[error("Invalid receipt for component '{component}': {reason}")]
    #[diagnostic(
        code(confstrap::receipt::invalid),
        help("Run 'confstrap doctor' to inspect the receipt, or reinstall with --force")
    )]
    ReceiptInvalid { component: String, reason: String },

    // Dependency errors
    #[error("Dependency not found: {name} (required by {required_by})")]
    #[diagnostic(
        code(confstrap::deps::not_found),
        help("Declare the component in the manifest or in a plugin manifest")
    )]
    DependencyNotFound { name: String, required_by: String },

    #[error("Circular dependency detected: {chain}")]
    #[diagnostic(
        code(confstrap::deps::circular),
        help("Remove the circular dependency from your manifest")
    )]
    CircularDependency { chain: String },

    #[error("Dependency depth exceeded {max_depth} while resolving '{name}'")]
    #[diagnostic(code(confstrap::deps::depth_exceeded))]
    DependencyDepthExceeded { name: String, max_depth: usize },

    #[error("Could not order components, unresolved: {components}")]
    #[diagnostic(code(confstrap::deps::unresolved))]
    UnresolvedDependencies { components: String },

    // Conflict errors
    #[error("Files matching '{pattern}' are claimed by both '{first}' and '{second}'")]
    #[diagnostic(
        code(confstrap::conflict::file),
        help("Each destination may only be written by one component in a resolved set")
    )]
    FileConflict {
        pattern: String,
        first: String,
        second: String,
    },

    #[error("Capability '{capability}' is provided by both '{first}' and '{second}'")]
    #[diagnostic(code(confstrap::conflict::capability))]
    CapabilityConflict {
        capability: String,
        first: String,
        second: String,
    },

    // Transaction / installation errors
    #[error("{kind} action failed for {source_path} -> {target_path}: {reason}")]
    #[diagnostic(code(confstrap::transaction::action_failed))]
    ActionFailed {
        kind: String,
        source_path: String,
        target_path: String,
        reason: String,
    },

    #[error(
        "Installation of component '{component}' failed (rolled back: [{}]): {source}",
        .completed.join(", ")
    )]
    #[diagnostic(code(confstrap::install::failed))]
    InstallationFailed {
        component: String,
        completed: Vec<String>,
        #[source]
        source: Box<ConfstrapError>,
    },

    #[error("Component '{name}' is not installed")]
    #[diagnostic(
        code(confstrap::install::not_installed),
        help("Run 'confstrap list --installed' to see installed components")
    )]
    ComponentNotInstalled { name: String },

    #[error("{operation} failed: {source}")]
    #[diagnostic(code(confstrap::operation::failed))]
    OperationFailed {
        operation: String,
        #[source]
        source: Box<ConfstrapError>,
    },

    // Receipt / drift errors
    #[error("Content drift in {path} (component '{component}'): expected {expected}, found {actual}")]
    #[diagnostic(code(confstrap::drift::content))]
    ContentDrift {
        component: String,
        path: String,
        expected: String,
        actual: String,
    },

    #[error("Tracked file missing: {path} (component '{component}')")]
    #[diagnostic(code(confstrap::drift::missing))]
    TrackedFileMissing { component: String, path: String },

    #[error("{count} problem(s) left unresolved")]
    #[diagnostic(
        code(confstrap::doctor::unresolved),
        help("Run 'confstrap doctor --repair' or reinstall with --force")
    )]
    ProblemsUnresolved { count: usize },

    // Content errors
    #[error("Failed to merge {path}: {reason}")]
    #[diagnostic(code(confstrap::merge::failed))]
    MergeFailed { path: String, reason: String },

    #[error("Failed to render template {path}: {reason}")]
    #[diagnostic(
        code(confstrap::template::render_failed),
        help("Pass missing variables with --var KEY=VALUE")
    )]
    TemplateRenderFailed { path: String, reason: String },

    // File system errors
    #[error("File not found: {path}")]
    #[diagnostic(code(confstrap::fs::not_found))]
    FileNotFound { path: String },

    #[error("Failed to read file: {path}: {reason}")]
    #[diagnostic(code(confstrap::fs::read_failed))]
    FileReadFailed { path: String, reason: String },

    #[error("Failed to write file: {path}: {reason}")]
    #[diagnostic(code(confstrap::fs::write_failed))]
    FileWriteFailed { path: String, reason: String },

    #[error("Refusing to remove {path}: no staging marker present")]
    #[diagnostic(code(confstrap::fs::unsafe_removal))]
    UnsafeRemoval { path: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(confstrap::fs::io_error))]
    IoError { message: String },
}

impl ConfstrapError {
    /// Malformed manifest, schema, plan or receipt
    pub fn is_validation(&self) -> bool {
        matches!(
            self.root(),
            Self::ManifestNotFound { .. }
                | Self::ManifestParseFailed { .. }
                | Self::ManifestInvalid { .. }
                | Self::ProfileNotFound { .. }
                | Self::InvalidActionPath { .. }
                | Self::InvalidPlan { .. }
                | Self::ReceiptInvalid { .. }
        )
    }

    /// Missing dependency, cycle or depth overflow
    pub fn is_dependency(&self) -> bool {
        matches!(
            self.root(),
            Self::DependencyNotFound { .. }
                | Self::CircularDependency { .. }
                | Self::DependencyDepthExceeded { .. }
                | Self::UnresolvedDependencies { .. }
        )
    }

    /// Overlapping file pattern or capability claims
    pub fn is_conflict(&self) -> bool {
        matches!(
            self.root(),
            Self::FileConflict { .. } | Self::CapabilityConflict { .. }
        )
    }

    /// Unwrap orchestration wrappers down to the error that caused them
    pub fn root(&self) -> &Self {
        match self {
            Self::OperationFailed { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<std::io::Error> for ConfstrapError {
    fn from(err: std::io::Error) -> Self {
        ConfstrapError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for ConfstrapError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfstrapError::ManifestParseFailed {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ConfstrapError {
    fn from(err: serde_json::Error) -> Self {
        ConfstrapError::ManifestParseFailed {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, ConfstrapError>;
