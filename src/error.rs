//! Error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the permission store and the invocation shim.
///
/// Malformed values for a known permission kind are deliberately absent:
/// the compiler drops them instead of failing.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid permission kind '{0}' (run `permbox kinds` for the full list)")]
    InvalidPermissionKind(String),

    #[error("invalid container name '{0}': expected [A-Za-z0-9][A-Za-z0-9_.-]*")]
    InvalidContainerName(String),

    #[error("invalid value {0:?}: values cannot contain a newline")]
    InvalidValue(String),

    #[error("{tool} {action} failed with {status}")]
    ExternalToolFailure {
        tool: String,
        action: String,
        status: String,
    },

    #[error("container tool '{0}' not found in PATH")]
    ToolNotFound(String),

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for permbox operations.
pub type Result<T> = std::result::Result<T, Error>;
