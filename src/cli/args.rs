//! CLI argument definitions using clap
//!
//! Commands:
//! - docmapper options
//! - docmapper check --config <path> [--environment <env>]
//! - docmapper plan-indexes --models <path> [--config <path>] [--environment <env>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// docmapper - configuration and index planning for a document mapper
#[derive(Parser, Debug)]
#[command(name = "docmapper")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List declared options and their defaults
    Options,

    /// Load a settings file and print the effective configuration
    Check {
        /// Path to settings file
        #[arg(long, default_value = "./docmapper.json")]
        config: PathBuf,

        /// Settings section to load
        #[arg(long, env = "DOCMAPPER_ENV")]
        environment: Option<String>,
    },

    /// Print the index creation calls a model manifest would issue
    PlanIndexes {
        /// Path to model manifest
        #[arg(long)]
        models: PathBuf,

        /// Path to settings file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Settings section to load
        #[arg(long, env = "DOCMAPPER_ENV")]
        environment: Option<String>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
