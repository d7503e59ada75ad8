//! CLI module for docmapper
//!
//! Provides command-line interface for:
//! - options: List declared options and defaults
//! - check: Load a settings file and print the effective configuration
//! - plan-indexes: Dry-run index creation for a model manifest

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{check, options, plan_indexes, run, run_command, ModelManifest};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_error, write_response};
