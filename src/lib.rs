//! docmapper - configuration and declarative index management for a
//! document mapper
//!
//! - [`config`]: options, settings loading, logger, purge
//! - [`index`]: per-model index specs and their creation
//! - [`driver`]: the document-store interfaces both depend on

pub mod cli;
pub mod config;
pub mod driver;
pub mod index;
pub mod mapping;

pub use config::{ConfigError, ConfigResult, ConfigStore};
pub use index::{IndexCatalog, IndexError, IndexRegistry, IndexResult, ModelDescriptor};
