//! CLI argument parsing with clap derive

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, AppFlags, BehaviourFlags, OutputFlags};
use crate::commands;
use crate::infra::config::DEFAULT_CONFIG_FILE;

/// Provision and track ML infrastructure on Google Cloud
#[derive(Parser)]
#[command(
    name = "edge",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Path to the project configuration file
    #[arg(short, long, global = true, env = "EDGE_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Answer prompts with their default (also set by CI / EDGE_YES)
    #[arg(short, long, global = true)]
    pub yes: bool,

    /// Log debug diagnostics to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Initialise edge for this repository and Google Cloud project
    Init,

    /// Remove a stale state lock
    ForceUnlock,

    /// Configuration related actions
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),

    /// Model related actions
    #[command(subcommand)]
    Model(commands::model::ModelCommand),

    /// Data version control related actions
    #[command(subcommand)]
    Dvc(commands::dvc::DvcCommand),

    /// Experiment tracking related actions
    #[command(subcommand)]
    Experiments(commands::experiments::ExperimentsCommand),
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns unexpected errors; anticipated failures are rendered and
    /// mapped to a failure exit code.
    pub async fn run(self) -> Result<ExitCode> {
        let Cli {
            config,
            quiet,
            no_color,
            yes,
            verbose: _,
            command,
        } = self;
        let app = AppContext::new(&AppFlags {
            output: OutputFlags { no_color, quiet },
            behaviour: BehaviourFlags { yes, config },
        });
        match command {
            Command::Init => commands::init::run(&app).await,
            Command::ForceUnlock => commands::force_unlock::run(&app).await,
            Command::Config(cmd) => commands::config::run(&app, cmd),
            Command::Model(cmd) => commands::model::run(&app, cmd).await,
            Command::Dvc(cmd) => commands::dvc::run(&app, cmd).await,
            Command::Experiments(cmd) => commands::experiments::run(&app, cmd).await,
        }
    }
}
