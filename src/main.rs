//! docmapper CLI entry point
//!
//! Installs the tracing subscriber and delegates everything else to the CLI
//! module. Failures are already reported on stdout; the process exits
//! non-zero.

use docmapper::cli;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "docmapper=info";

fn main() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if cli::run().is_err() {
        std::process::exit(1);
    }
}
