//! `edge dvc`: point the repository's DVC remote at the project bucket.

use std::process::ExitCode;

use anyhow::Result;
use clap::Subcommand;

use crate::app::AppContext;
use crate::application::ports::{ConfigStore, DvcRepository, ProgressReporter};
use crate::application::services::dvc::{self, DvcInspection};
use crate::application::services::state_store::{AcquireOptions, StateStore};
use crate::domain::Status;
use crate::infra::dvc::DvcCli;
use crate::output::{CommandMessages, CommandTui, Step};

use super::common::{open_state, precommand_checks, project_root, state_location};

const NEXT_STEPS: &str = "What's next? We suggest you proceed with:

  Train and deploy a model:
    edge model init <name>
    edge model deploy <name>

Happy herding! 🐏";

/// DVC subcommands.
#[derive(Subcommand)]
pub enum DvcCommand {
    /// Initialise DVC with the project bucket as its default remote
    Init,
}

/// Run the dvc command.
///
/// # Errors
///
/// Returns unexpected (non-domain) errors.
pub async fn run(app: &AppContext, cmd: DvcCommand) -> Result<ExitCode> {
    match cmd {
        DvcCommand::Init => {
            let tui = CommandTui::begin(
                &app.output,
                "Initialising data version control (DVC)",
                CommandMessages::new("DVC initialised successfully", "DVC initialisation failed")
                    .with_success_message(NEXT_STEPS)
                    .with_failure_message("See the errors above. See README for more details."),
            );
            let outcome = init(app).await;
            tui.conclude(outcome)
        }
    }
}

async fn init(app: &AppContext) -> Result<()> {
    let config = app.config_store.load()?;
    precommand_checks(app, &config).await?;

    let backend = app.state_backend(&config);
    let store = StateStore::new(&backend, state_location(&config));
    let step = Step::new(&app.output, "🗂️", "Configuring data version control");
    let lease = open_state(&step, &store, AcquireOptions::read_only()).await?;
    let bucket_path = lease.state.storage().map(|s| s.bucket_path.clone());
    let bucket_path = lease.release(bucket_path).await?;
    let desired = dvc::remote_path(&bucket_path, &config.storage_bucket.dvc_store_directory);

    let repo = DvcCli::new(&app.runner, project_root(app));
    let sub = step.sub_step("Checking if DVC is already initialised");
    let inspection = sub.finish_value(dvc::inspect(&repo, &desired).await)?;

    if let DvcInspection::Mismatch { current } = inspection {
        let mut sub = step.sub_step_with(
            "DVC remote storage does not match edge configuration",
            Status::Warning,
        );
        let destroy = offer_destroy(app, &mut sub, &desired, &current);
        if sub.finish_value(destroy)? {
            step.sub_step("Destroying DVC repository")
                .finish(repo.destroy())?;
        }
    }

    step.sub_step(&format!("Setting DVC remote storage to {desired}"))
        .finish(dvc::configure(&repo, &desired).await)?;
    Ok(())
}

fn offer_destroy(
    app: &AppContext,
    reporter: &mut impl ProgressReporter,
    desired: &str,
    current: &str,
) -> Result<bool> {
    reporter.add_explanation(&format!(
        "Expected {desired}, got {current}. To use the new storage bucket it is advised to \
         destroy the DVC repository and initialise it from scratch."
    ));
    reporter.set_dirty();
    app.confirm("Do you want to destroy DVC and initialise it from scratch?", false)
}
