//! File system errors

use std::path::Path;

use super::ConfstrapError;

/// Creates a file not found error
pub fn not_found(path: &Path) -> ConfstrapError {
    ConfstrapError::FileNotFound {
        path: path.display().to_string(),
    }
}

/// Creates a file read error
pub fn read_failed(path: &Path, err: impl std::fmt::Display) -> ConfstrapError {
    ConfstrapError::FileReadFailed {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

/// Creates a file write error
pub fn write_failed(path: &Path, err: impl std::fmt::Display) -> ConfstrapError {
    ConfstrapError::FileWriteFailed {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

/// Creates a refusal to delete an unmarked directory
pub fn unsafe_removal(path: &Path) -> ConfstrapError {
    ConfstrapError::UnsafeRemoval {
        path: path.display().to_string(),
    }
}

/// Creates an IO error
pub fn io_error(message: impl Into<String>) -> ConfstrapError {
    ConfstrapError::IoError {
        message: message.into(),
    }
}
