//! `edge config`: read values from `edge.yaml`.

use std::process::ExitCode;

use anyhow::Result;
use clap::Subcommand;

use crate::app::AppContext;
use crate::application::ports::ConfigStore;
use crate::output::CommandTui;

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Get configured region
    GetRegion,
}

/// Run the config command.
///
/// # Errors
///
/// Returns unexpected (non-domain) errors.
pub fn run(app: &AppContext, cmd: ConfigCommand) -> Result<ExitCode> {
    let tui = CommandTui::silent(&app.output);
    let outcome = match cmd {
        ConfigCommand::GetRegion => app
            .config_store
            .load()
            .map(|config| app.output.value(&config.google_cloud_project.region)),
    };
    tui.conclude(outcome)
}
