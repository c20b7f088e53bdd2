//! `edge init`: check the local tooling and Google Cloud project, create
//! the storage bucket, the state file and `edge.yaml`.

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;
use crate::application::ports::{CloudEnvironment, ConfigStore, ObjectStore, ProgressReporter, Tool};
use crate::application::services::environment::{
    self, GcloudSettings, MIN_GCLOUD, MIN_GCLOUD_ALPHA, MIN_HELM, MIN_KUBECTL,
};
use crate::application::services::reconcile;
use crate::application::services::state_store::{AcquireOptions, LoadMode, StateStore};
use crate::application::services::precommand;
use crate::domain::config::{GcpProjectConfig, StorageBucketConfig};
use crate::domain::error::DomainError;
use crate::domain::state::StorageState;
use crate::domain::{EdgeConfig, EdgeState, Status};
use crate::infra::gcloud::GcloudEnvironment;
use crate::infra::providers::BucketProvider;
use crate::output::{CommandMessages, CommandTui, Step};

use super::common::state_location;

const STORAGE_API: &str = "storage-component.googleapis.com";

const NEXT_STEPS: &str = "What's next? We suggest you proceed with:

  Commit the new edge configuration to git:
    git add edge.yaml && git commit -m \"Initialise edge\"

  Configure an experiment tracker (optional):
    edge experiments init

  Configure data version control:
    edge dvc init

  Train and deploy a model:
    edge model init <name>
    edge model deploy <name>

Happy herding! 🐏";

/// Run `edge init`.
///
/// # Errors
///
/// Returns unexpected (non-domain) errors.
pub async fn run(app: &AppContext) -> Result<ExitCode> {
    let tui = CommandTui::begin(
        &app.output,
        "Initialising edge",
        CommandMessages::new("Initialised successfully", "Initialisation failed")
            .with_success_message(NEXT_STEPS)
            .with_failure_message("See the errors above. See README for more details."),
    );
    let outcome = execute(app).await;
    tui.conclude(outcome)
}

async fn execute(app: &AppContext) -> Result<()> {
    let env = GcloudEnvironment::new(&app.runner);

    check_local_environment(app, &env).await?;
    let settings = check_gcp_environment(app, &env).await?;
    let config = initialise_storage(app, &env, &settings).await?;

    let step = Step::new(&app.output, "⚙️", "Saving configuration");
    step.sub_step(&format!(
        "Saving configuration to {}",
        app.config_store.path().display()
    ))
    .finish(app.config_store.save(&config))?;
    Ok(())
}

async fn check_local_environment(app: &AppContext, env: &impl CloudEnvironment) -> Result<()> {
    let step = Step::new(&app.output, "🖥️", "Checking your local environment");
    let checks = [
        ("Checking gcloud version", Tool::Gcloud, MIN_GCLOUD),
        ("Checking gcloud alpha component version", Tool::GcloudAlpha, MIN_GCLOUD_ALPHA),
        ("Checking kubectl version", Tool::Kubectl, MIN_KUBECTL),
        ("Checking helm version", Tool::Helm, MIN_HELM),
    ];
    for (message, tool, minimum) in checks {
        let sub = step.sub_step(message);
        let found = sub.finish_value(environment::check_tool_version(env, tool, minimum).await)?;
        tracing::debug!(?tool, %found, "tool version accepted");
    }
    Ok(())
}

async fn check_gcp_environment(
    app: &AppContext,
    env: &impl CloudEnvironment,
) -> Result<GcloudSettings> {
    let step = Step::new(&app.output, "☁️", "Checking your GCP environment");
    step.sub_step("Checking if you have authenticated with gcloud")
        .finish(precommand::check_authenticated(env).await)?;

    let mut sub = step.sub_step("Verifying gcloud configuration");
    let verified = verify_settings(app, env, &mut sub).await;
    let settings = sub.finish_value(verified)?;

    step.sub_step(&format!("{} is available on Vertex AI", settings.region))
        .finish(environment::check_region(&settings.region))?;

    let project = &settings.project;
    step.sub_step(&format!("Checking if project '{project}' exists"))
        .finish(precommand::check_project_exists(env, project).await)?;
    step.sub_step(&format!("Checking if billing is enabled for project '{project}'"))
        .finish(precommand::check_billing(env, project).await)?;
    Ok(settings)
}

/// Read the gcloud account, project and region and let the operator confirm each.
async fn verify_settings(
    app: &AppContext,
    env: &impl CloudEnvironment,
    reporter: &mut impl ProgressReporter,
) -> Result<GcloudSettings> {
    let settings = environment::read_gcloud_settings(env).await?;
    reporter.update(None, Some(Status::Neutral));
    reporter.set_dirty();

    if !app.confirm(
        &format!("Is this the correct gcloud account: {}", settings.account),
        true,
    )? {
        return Err(DomainError::new(
            "Run `gcloud auth login && gcloud auth application-default login` to authenticate \
             with the correct account",
        )
        .into());
    }
    if !app.confirm(
        &format!("Is this the correct project id: {}", settings.project),
        true,
    )? {
        return Err(DomainError::new(
            "Run `gcloud config set project <project_id>` to set the correct project id",
        )
        .into());
    }
    if !app.confirm(&format!("Is this the correct region: {}", settings.region), true)? {
        return Err(DomainError::new(
            "Run `gcloud config set compute/region <region>` to set the correct region",
        )
        .into());
    }
    Ok(settings)
}

/// Enable the Storage API, reconcile the bucket and write the state file.
async fn initialise_storage(
    app: &AppContext,
    env: &impl CloudEnvironment,
    settings: &GcloudSettings,
) -> Result<EdgeConfig> {
    let step = Step::new(
        &app.output,
        "💾",
        "Initialising Google Storage and edge state file",
    );
    step.sub_step("Enabling Storage API").finish(
        environment::ensure_service_enabled(env, &settings.project, STORAGE_API).await,
    )?;

    let previous = previous_config(app, settings);
    let mut sub = step.sub_step_with("Configuring Google Storage bucket", Status::Neutral);
    sub.set_dirty();
    let bucket_name = sub.finish_value(app.input(
        "Choose a name for the storage bucket used for data version control, model assets \
         and the edge state (see https://cloud.google.com/storage/docs/naming-buckets)",
        previous
            .as_ref()
            .map(|c| c.storage_bucket.bucket_name.as_str()),
    ))?;

    let mut config = EdgeConfig::new(
        GcpProjectConfig {
            project_id: settings.project.clone(),
            region: settings.region.clone(),
        },
        StorageBucketConfig::new(bucket_name.clone()),
    );
    if let Some(previous) = previous {
        config.experiments = previous.experiments;
        config.models = previous.models;
        config.storage_bucket = StorageBucketConfig {
            bucket_name: bucket_name.clone(),
            ..previous.storage_bucket
        };
    }

    let provider = BucketProvider::new(&app.runner, AppContext::project(&config));
    let mut sub = step.sub_step(&format!("Configuring storage bucket '{bucket_name}'"));
    let ensured = reconcile::ensure(&provider, &mut sub, &bucket_name, &settings.region).await;
    let bucket_path = sub.finish_value(ensured)?.into_descriptor();

    let backend = app.state_backend(&config);
    let store = StateStore::new(&backend, state_location(&config));
    let mut sub = step.sub_step("Checking if edge state file exists");
    let checked = confirm_start_over(app, &store, &mut sub).await;
    let start_over = sub.finish_value(checked)?;

    if start_over {
        let sub = step.sub_step("Saving state file");
        let saved = save_fresh_state(&store, bucket_path).await;
        sub.finish(saved)?;
    } else {
        step.sub_step_with("Saving state file skipped", Status::Warning)
            .finish(Ok(()))?;
    }
    Ok(config)
}

/// `true` when the state file should be (re)written: it is absent, or the
/// operator agreed to discard it.
async fn confirm_start_over<O: ObjectStore>(
    app: &AppContext,
    store: &StateStore<'_, O>,
    reporter: &mut impl ProgressReporter,
) -> Result<bool> {
    if !store.exists().await? {
        return Ok(true);
    }
    reporter.update(
        Some(
            "The state file already exists. This means that edge has already been initialised \
             using this storage bucket.",
        ),
        Some(Status::Warning),
    );
    reporter.set_dirty();
    app.confirm(
        "Do you want to delete the state and start over (this action is destructive!)",
        false,
    )
}

/// Replace the state document with one holding only the storage record.
async fn save_fresh_state<O: ObjectStore>(
    store: &StateStore<'_, O>,
    bucket_path: String,
) -> Result<()> {
    let opts = AcquireOptions {
        lock: true,
        save: true,
        mode: LoadMode::Permissive,
    };
    let mut lease = store.acquire(opts).await?;
    lease.state = EdgeState {
        storage: Some(StorageState { bucket_path }),
        ..EdgeState::default()
    };
    lease.release(Ok(())).await
}

/// The existing configuration, when it belongs to the same project.
fn previous_config(app: &AppContext, settings: &GcloudSettings) -> Option<EdgeConfig> {
    if !app.config_store.exists() {
        return None;
    }
    match app.config_store.load() {
        Ok(config) if config.google_cloud_project.project_id == settings.project => Some(config),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!(error = %e, "ignoring unreadable configuration");
            None
        }
    }
}
