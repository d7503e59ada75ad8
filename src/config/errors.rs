//! Configuration error types
//!
//! Error codes:
//! - DOCMAP_UNKNOWN_OPTION
//! - DOCMAP_INVALID_OPTION_VALUE
//! - DOCMAP_CONFIG_LOAD_FAILED
//! - DOCMAP_MISSING_DEFAULT_DATABASE
//! - DOCMAP_DRIVER_* (passthrough)

use std::path::PathBuf;

use thiserror::Error;

use crate::driver::DriverError;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Failures while reading a settings document
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    /// Settings file does not exist
    #[error("Settings file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Settings file exists but could not be read
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Settings file is not valid JSON
    #[error("Invalid settings JSON in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Settings document has the wrong shape
    #[error("Malformed settings: {0}")]
    Malformed(String),
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Read or write of an option that was never declared
    #[error("Unknown configuration option: {0}")]
    UnknownOption(String),

    /// Value does not fit the option's declared kind
    #[error("Invalid value for option '{name}': expected {expected}, got {value}")]
    InvalidOptionValue {
        name: String,
        expected: &'static str,
        value: serde_json::Value,
    },

    /// Settings could not be loaded
    #[error(transparent)]
    Load(#[from] ConfigLoadError),

    /// Purge needs `databases.default.name`
    #[error("No default database configured")]
    MissingDefaultDatabase,

    /// Store operation failed
    #[error(transparent)]
    Driver(#[from] DriverError),
}

impl ConfigError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::UnknownOption(_) => "DOCMAP_UNKNOWN_OPTION",
            ConfigError::InvalidOptionValue { .. } => "DOCMAP_INVALID_OPTION_VALUE",
            ConfigError::Load(_) => "DOCMAP_CONFIG_LOAD_FAILED",
            ConfigError::MissingDefaultDatabase => "DOCMAP_MISSING_DEFAULT_DATABASE",
            ConfigError::Driver(e) => e.code(),
        }
    }
}
