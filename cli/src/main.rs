//! edge CLI - Provision and track ML infrastructure on Google Cloud

#![cfg_attr(test, allow(clippy::expect_used))]

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use edge_cli::cli::Cli;

/// Environment variable holding the log filter, e.g. `EDGE_LOG=edge_cli=debug`.
const LOG_ENV: &str = "EDGE_LOG";

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Progress output owns stdout, so diagnostics go to stderr.
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match cli.run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
