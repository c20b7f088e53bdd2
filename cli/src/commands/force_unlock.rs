//! `edge force-unlock`: remove a lock marker left behind by an interrupted command.

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;
use crate::application::ports::ConfigStore;
use crate::application::services::state_store::StateStore;
use crate::output::{CommandMessages, CommandTui, Step};

use super::common::state_location;

/// Run `edge force-unlock`.
///
/// # Errors
///
/// Returns unexpected (non-domain) errors.
pub async fn run(app: &AppContext) -> Result<ExitCode> {
    let tui = CommandTui::begin(
        &app.output,
        "Unlocking edge state",
        CommandMessages::new("State unlocked", "Unlocking failed"),
    );
    let outcome = execute(app).await;
    tui.conclude(outcome)
}

async fn execute(app: &AppContext) -> Result<()> {
    let config = app.config_store.load()?;
    let backend = app.state_backend(&config);
    let store = StateStore::new(&backend, state_location(&config));

    let step = Step::new(&app.output, "🔓", "Removing the state lock");
    step.sub_step(&format!("Removing {}", store.location().lock_key))
        .finish(store.unlock().await)?;
    Ok(())
}
