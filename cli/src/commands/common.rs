//! Building blocks shared by the command handlers.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::app::AppContext;
use crate::application::ports::{ConfigStore, ObjectStore};
use crate::application::services::environment::ensure_service_enabled;
use crate::application::services::precommand;
use crate::application::services::state_store::{AcquireOptions, StateLease, StateStore};
use crate::domain::{EdgeConfig, StateLocation};
use crate::infra::gcloud::GcloudEnvironment;
use crate::output::Step;

/// Location of the project's state document.
#[must_use]
pub fn state_location(config: &EdgeConfig) -> StateLocation {
    StateLocation::new(
        &config.storage_bucket.bucket_name,
        &config.google_cloud_project.project_id,
    )
}

/// Directory holding `edge.yaml`; the repository the commands operate on.
#[must_use]
pub fn project_root(app: &AppContext) -> PathBuf {
    app.config_store
        .path()
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

/// Authentication, project and billing checks run before any command that
/// touches Google Cloud.
///
/// # Errors
///
/// Returns the first fatal check.
pub async fn precommand_checks(app: &AppContext, config: &EdgeConfig) -> Result<()> {
    let env = GcloudEnvironment::new(&app.runner);
    let project_id = &config.google_cloud_project.project_id;
    let step = Step::new(&app.output, "☁️", "Checking your GCP environment");

    step.sub_step("Checking if you have authenticated with gcloud")
        .finish(precommand::check_authenticated(&env).await)?;
    step.sub_step(&format!("Checking if project '{project_id}' exists"))
        .finish(precommand::check_project_exists(&env, project_id).await)?;
    step.sub_step(&format!(
        "Checking if billing is enabled for project '{project_id}'"
    ))
    .finish(precommand::check_billing(&env, project_id).await)?;
    Ok(())
}

/// Enable each Google Cloud API in `services` that is not enabled yet.
///
/// # Errors
///
/// Returns the first API that cannot be enabled.
pub async fn enable_services(app: &AppContext, config: &EdgeConfig, services: &[&str]) -> Result<()> {
    let env = GcloudEnvironment::new(&app.runner);
    let project_id = &config.google_cloud_project.project_id;
    let step = Step::new(&app.output, "🛠️", "Enabling required Google Cloud APIs");
    for service in services {
        step.sub_step(&format!("Enabling {service}"))
            .finish(ensure_service_enabled(&env, project_id, service).await)?;
    }
    Ok(())
}

/// Acquire the state under a SubStep of `step`.
///
/// # Errors
///
/// Returns the acquire failure (missing bucket, held lock, absent or corrupted state).
pub async fn open_state<'s, 'a, O: ObjectStore>(
    step: &Step<'_>,
    store: &'s StateStore<'a, O>,
    opts: AcquireOptions,
) -> Result<StateLease<'s, 'a, O>> {
    let message = if opts.lock {
        "Locking and loading state"
    } else {
        "Loading state"
    };
    step.sub_step(message).finish_value(store.acquire(opts).await)
}
