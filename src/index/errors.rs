//! Index error types
//!
//! Error codes:
//! - DOCMAP_INVALID_INDEX_SPEC
//! - DOCMAP_UNKNOWN_OPTION and friends (from the configuration gate)
//! - DOCMAP_DRIVER_* (passthrough)

use thiserror::Error;

use crate::config::ConfigError;
use crate::driver::DriverError;

/// Result type for index operations
pub type IndexResult<T> = Result<T, IndexError>;

/// Index declaration and creation errors
#[derive(Debug, Error)]
pub enum IndexError {
    /// Definition has no field entry or badly typed values
    #[error("Invalid index spec: {0}")]
    InvalidIndexSpec(String),

    /// The autocreate gate could not be read
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Store rejected an index
    #[error(transparent)]
    Driver(#[from] DriverError),
}

impl IndexError {
    /// Create an invalid spec error
    pub fn invalid(reason: impl Into<String>) -> Self {
        IndexError::InvalidIndexSpec(reason.into())
    }

    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            IndexError::InvalidIndexSpec(_) => "DOCMAP_INVALID_INDEX_SPEC",
            IndexError::Config(e) => e.code(),
            IndexError::Driver(e) => e.code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_pass_through() {
        assert_eq!(IndexError::invalid("empty").code(), "DOCMAP_INVALID_INDEX_SPEC");
        let driver = IndexError::from(DriverError::Internal("x".into()));
        assert_eq!(driver.code(), "DOCMAP_DRIVER_INTERNAL");
        let config = IndexError::from(ConfigError::UnknownOption("autocreate_indexes".into()));
        assert_eq!(config.code(), "DOCMAP_UNKNOWN_OPTION");
    }
}
