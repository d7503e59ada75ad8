//! Mapper configuration
//!
//! # Responsibilities
//!
//! - Declared options with defaults and kind-checked writes
//! - Loading settings documents and merging them into the store
//! - Database and session descriptors
//! - The mapper logger, resolved lazily
//! - Purging the default database
//!
//! # Invariants
//!
//! - Undeclared option names are never readable or writable
//! - Settings keys are normalized once, at ingestion
//! - `apply_settings` is not atomic

mod errors;
mod logger;
pub mod options;
mod settings;
mod store;

pub use errors::{ConfigError, ConfigLoadError, ConfigResult};
pub use logger::{HostEnvironment, JsonLogger, Logger, LoggerSetting, Severity};
pub use options::{standard_options, OptionKind, OptionRegistry};
pub use settings::{
    canonical_key, normalize_keys, DatabaseConfig, FileSettingsLoader, SessionConfig,
    SettingsLoader, ENVIRONMENT_VAR,
};
pub use store::{ConfigStore, DEFAULT_ALIAS};
