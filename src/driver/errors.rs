//! Driver error types
//!
//! Errors raised by document-store drivers are passed through this layer
//! unchanged. The variants only give callers something to match on.

use thiserror::Error;

/// Result type for driver operations
pub type DriverResult<T> = Result<T, DriverError>;

/// Opaque driver failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    /// The store could not be reached
    #[error("Document store unavailable: {0}")]
    Unavailable(String),

    /// The store rejected a command
    #[error("Command '{command}' failed: {message}")]
    CommandFailed { command: String, message: String },

    /// Driver-internal failure (poisoned state, broken invariants)
    #[error("Driver internal error: {0}")]
    Internal(String),
}

impl DriverError {
    /// Build a command failure
    pub fn command_failed(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CommandFailed {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            DriverError::Unavailable(_) => "DOCMAP_DRIVER_UNAVAILABLE",
            DriverError::CommandFailed { .. } => "DOCMAP_DRIVER_COMMAND_FAILED",
            DriverError::Internal(_) => "DOCMAP_DRIVER_INTERNAL",
        }
    }
}
