//! `edge experiments`: Sacred experiment tracking: MongoDB and Omniboard on GKE.

use std::process::ExitCode;

use anyhow::Result;
use clap::Subcommand;

use crate::app::AppContext;
use crate::application::ports::{ConfigStore, ExperimentTracker, ProgressReporter, SecretVersions};
use crate::application::services::experiments;
use crate::application::services::reconcile;
use crate::application::services::state_store::{AcquireOptions, StateStore};
use crate::domain::config::{DEFAULT_GKE_CLUSTER_NAME, validate_resource_name};
use crate::domain::state::ExperimentsState;
use crate::domain::{EdgeConfig, EdgeState, ExperimentsConfig, Status};
use crate::infra::kubernetes::KubernetesTracker;
use crate::infra::providers::{ClusterProvider, SecretProvider};
use crate::output::{CommandMessages, CommandTui, Step};

use super::common::{enable_services, open_state, precommand_checks, state_location};

const KUBERNETES_API: &str = "container.googleapis.com";
const SECRET_MANAGER_API: &str = "secretmanager.googleapis.com";

/// Experiments subcommands.
#[derive(Subcommand)]
pub enum ExperimentsCommand {
    /// Install the experiment tracker on a GKE cluster
    Init,
    /// Print the Omniboard dashboard URL
    GetDashboard,
    /// Print the MongoDB connection string
    GetMongodb,
}

/// Run the experiments command.
///
/// # Errors
///
/// Returns unexpected (non-domain) errors.
pub async fn run(app: &AppContext, cmd: ExperimentsCommand) -> Result<ExitCode> {
    match cmd {
        ExperimentsCommand::Init => {
            let mut tui = CommandTui::begin(
                &app.output,
                "Initialising experiment tracking",
                CommandMessages::new(
                    "Experiment tracking initialised successfully",
                    "Experiment tracking initialisation failed",
                )
                .with_failure_message("See the errors above. See README for more details."),
            );
            let outcome = init(app).await;
            if let Ok(url) = &outcome {
                tui.messages.success_message = Some(format!(
                    "Now you can track experiments, and view them in Omniboard dashboard at {url}\n\n\
                     What's next? We suggest you proceed with:\n\n  \
                     Train and deploy a model:\n    \
                     edge model init <name>\n    \
                     edge model deploy <name>\n\n\
                     Happy herding! 🐏"
                ));
            }
            tui.conclude(outcome)
        }
        ExperimentsCommand::GetDashboard => {
            let tui = CommandTui::silent(&app.output);
            let outcome = get_dashboard(app).await;
            tui.conclude(outcome)
        }
        ExperimentsCommand::GetMongodb => {
            let tui = CommandTui::silent(&app.output);
            let outcome = get_mongodb(app).await;
            tui.conclude(outcome)
        }
    }
}

async fn init(app: &AppContext) -> Result<String> {
    let mut config = app.config_store.load()?;
    precommand_checks(app, &config).await?;
    enable_services(app, &config, &[KUBERNETES_API, SECRET_MANAGER_API]).await?;

    let backend = app.state_backend(&config);
    let store = StateStore::new(&backend, state_location(&config));
    let step = Step::new(&app.output, "⚙️", "Configuring experiment tracking");
    let mut lease = open_state(&step, &store, AcquireOptions::exclusive()).await?;
    let outcome = set_up_tracking(app, &step, &mut config, &mut lease.state).await;
    let url = lease.release(outcome).await?;

    step.sub_step(&format!(
        "Saving configuration to {}",
        app.config_store.path().display()
    ))
    .finish(app.config_store.save(&config))?;
    Ok(url)
}

async fn set_up_tracking(
    app: &AppContext,
    step: &Step<'_>,
    config: &mut EdgeConfig,
    state: &mut EdgeState,
) -> Result<String> {
    let mut sub = step.sub_step_with("Configuring Kubernetes cluster name on GCP", Status::Neutral);
    let chosen = choose_cluster_name(app, config, &mut sub);
    let settings = sub.finish_value(chosen)?;
    config.experiments = Some(settings.clone());

    let project = AppContext::project(config);
    let region = project.region.clone();
    let tracker = KubernetesTracker::new(&app.runner, project.project_id.clone());
    let clusters = ClusterProvider::new(&app.runner, project.clone());
    let secrets = SecretProvider::new(&app.runner, project);

    let cluster_step = Step::new(&app.output, "☸️", "Setting up Kubernetes cluster");
    let mut sub = cluster_step.sub_step(&format!(
        "Configuring Kubernetes cluster '{}'",
        settings.gke_cluster_name
    ));
    let ensured = reconcile::ensure(&clusters, &mut sub, &settings.gke_cluster_name, &region).await;
    let cluster = sub.finish_value(ensured)?.into_descriptor();
    cluster_step
        .sub_step("Getting cluster credentials")
        .finish(tracker.get_credentials(&cluster).await)?;

    let mongo_step = Step::new(&app.output, "🍃", "Installing MongoDB");
    let mut sub = mongo_step.sub_step("Checking if MongoDB is installed");
    let installed = experiments::install_mongodb(&tracker, &mut sub).await;
    sub.finish(installed)?;
    let mut sub = mongo_step.sub_step("Getting MongoDB connection string");
    let connected = experiments::mongodb_connection(&tracker, &mut sub, app.poll_interval).await;
    let connection = sub.finish_value(connected)?;
    mongo_step
        .sub_step(&format!(
            "Storing MongoDB connection string {} in Kubernetes",
            connection.masked_external
        ))
        .finish(tracker.store_connection_secret(&connection.internal).await)?;

    let secret_id = &settings.mongodb_connection_string_secret;
    let secret_step = Step::new(&app.output, "🔐", "Publishing MongoDB connection string");
    let mut sub = secret_step.sub_step(&format!("Configuring secret '{secret_id}'"));
    let ensured = reconcile::ensure(&secrets, &mut sub, secret_id, &region).await;
    sub.finish_value(ensured)?;
    secret_step
        .sub_step("Adding a new secret version")
        .finish(experiments::publish_connection_string(&secrets, secret_id, &connection).await)?;

    let omniboard_step = Step::new(&app.output, "📊", "Installing Omniboard");
    let mut sub = omniboard_step.sub_step("Deploying Omniboard");
    let installed = experiments::install_omniboard(&tracker, &mut sub, app.poll_interval).await;
    let dashboard_url = sub.finish_value(installed)?;

    state.experiments = Some(ExperimentsState {
        dashboard_url: dashboard_url.clone(),
    });
    Ok(dashboard_url)
}

fn choose_cluster_name(
    app: &AppContext,
    config: &EdgeConfig,
    reporter: &mut impl ProgressReporter,
) -> Result<ExperimentsConfig> {
    reporter.add_explanation(
        "If a name for an existing cluster is provided, this cluster will be used. Otherwise, \
         edge will create a cluster with GKE Autopilot.",
    );
    reporter.set_dirty();
    let previous = config.experiments.as_ref();
    let name = app.input(
        "Choose a name for a Kubernetes cluster to use",
        Some(previous.map_or(DEFAULT_GKE_CLUSTER_NAME, |e| e.gke_cluster_name.as_str())),
    )?;
    validate_resource_name("cluster", &name)?;
    Ok(match previous {
        Some(previous) => ExperimentsConfig {
            gke_cluster_name: name,
            ..previous.clone()
        },
        None => ExperimentsConfig::new(name),
    })
}

async fn get_dashboard(app: &AppContext) -> Result<()> {
    let config = app.config_store.load()?;
    let backend = app.state_backend(&config);
    let store = StateStore::new(&backend, state_location(&config));
    let step = Step::silent(&app.output);
    let lease = open_state(&step, &store, AcquireOptions::read_only()).await?;
    let url = lease.state.experiments().map(|e| e.dashboard_url.clone());
    let url = lease.release(url).await?;
    app.output.value(&url);
    Ok(())
}

async fn get_mongodb(app: &AppContext) -> Result<()> {
    let config = app.config_store.load()?;
    let secret_id = &config.experiments()?.mongodb_connection_string_secret;
    let secrets = SecretProvider::new(&app.runner, AppContext::project(&config));
    let connection = secrets.latest(secret_id).await?;
    app.output.value(&connection);
    Ok(())
}
