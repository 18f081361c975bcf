//! Centralized error types for tool execution.
//!
//! Every handler returns `Result<ToolResult, ToolError>`. The dispatcher turns
//! a `ToolError` into a failed [`ToolResult`](crate::types::ToolResult), so no
//! error ever escapes past the tool boundary.
//!
//! Errors fall into three tiers:
//!
//! - **Validation**: a required parameter is missing or malformed. Raised
//!   before any I/O is attempted.
//! - **Operational**: not-found, permission denied, pattern absent, timeouts.
//! - **Cancellation**: the user declined a dangerous command. This produces a
//!   distinct `cancelled: true` result shape.
//!
//! # Example
//!
//! ```
//! use toolbench::error::{ToolError, ToolOutcome};
//!
//! fn require_pattern(pattern: Option<&str>) -> ToolOutcome<&str> {
//!     pattern.ok_or_else(|| ToolError::missing("pattern"))
//! }
//!
//! let err = require_pattern(None).unwrap_err();
//! assert!(err.is_validation());
//! assert_eq!(err.to_string(), "Missing required parameter: pattern");
//! ```

use std::io;
use std::path::Path;

use thiserror::Error;

/// Result type alias using `ToolError`.
pub type ToolOutcome<T> = Result<T, ToolError>;

/// The fixed message reported when the user declines a command.
pub const CANCELLED_MESSAGE: &str = "Operation cancelled by user";

/// Error raised by a tool handler.
#[derive(Debug, Error)]
pub enum ToolError {
    // ============== Validation Errors ==============
    /// A required parameter was absent or had the wrong JSON type.
    #[error("Missing required parameter: {name}")]
    MissingParameter {
        /// The parameter name.
        name: String,
    },

    /// A parameter was present but its value is not acceptable.
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter {
        /// The parameter name.
        name: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// The invocation named a tool this engine does not provide.
    #[error("Unknown tool: {name}")]
    UnknownTool {
        /// The name as received.
        name: String,
    },

    // ============== Operational Errors ==============
    /// A file or directory does not exist.
    #[error("File not found: {path}")]
    NotFound {
        /// The path that was accessed.
        path: String,
    },

    /// The OS refused access to a path.
    #[error("Permission denied: {path}")]
    PermissionDenied {
        /// The path that was accessed.
        path: String,
    },

    /// Any other I/O failure.
    #[error("I/O error on {path}: {message}")]
    Io {
        /// The path being accessed.
        path: String,
        /// The underlying error message.
        message: String,
    },

    /// `Edit` could not find the string to replace.
    #[error("String not found in {path}")]
    StringNotFound {
        /// The edited file.
        path: String,
    },

    /// A subprocess exceeded its wall-clock limit and was killed.
    #[error("Command timed out after {timeout_ms} ms")]
    Timeout {
        /// The limit that was exceeded.
        timeout_ms: u64,
    },

    // ============== Cancellation ==============
    /// The user declined a dangerous operation at the permission prompt.
    #[error("Operation cancelled by user")]
    Cancelled,

    // ============== Wrapped Errors ==============
    /// Failure inside the engine itself (e.g. a background task panicked).
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the failure.
        message: String,
    },
}

// ============== Constructor Methods ==============

impl ToolError {
    /// Creates a missing-parameter error.
    #[must_use]
    pub fn missing(name: impl Into<String>) -> Self {
        Self::MissingParameter { name: name.into() }
    }

    /// Creates an invalid-parameter error.
    #[must_use]
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Maps an I/O error on `path` to the matching variant by error kind.
    #[must_use]
    pub fn from_io(path: &Path, err: &io::Error) -> Self {
        let path = path.display().to_string();
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound { path },
            io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            _ => Self::Io {
                path,
                message: err.to_string(),
            },
        }
    }
}

// ============== Category Methods ==============

impl ToolError {
    /// Returns `true` if the error was raised before any I/O happened.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingParameter { .. } | Self::InvalidParameter { .. } | Self::UnknownTool { .. }
        )
    }

    /// Returns `true` if the user declined the operation.
    #[must_use]
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<tokio::task::JoinError> for ToolError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::internal(format!("background task failed: {err}"))
    }
}

// ============== Unit Tests ==============
