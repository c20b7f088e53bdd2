//! `edge model`: Vertex AI endpoints and deployments, one per model.

use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::app::AppContext;
use crate::application::ports::{ConfigStore, ProgressReporter};
use crate::application::services::models;
use crate::application::services::reconcile;
use crate::application::services::state_store::{AcquireOptions, StateStore};
use crate::domain::config::validate_resource_name;
use crate::domain::error::DomainError;
use crate::domain::resource::endpoint_console_url;
use crate::domain::state::ModelState;
use crate::domain::{EdgeConfig, EdgeState, ModelConfig, Status};
use crate::infra::providers::EndpointProvider;
use crate::infra::trained_model::read_trained_model;
use crate::infra::vertex::VertexServing;
use crate::output::{CommandMessages, CommandTui, Step};

use super::common::{enable_services, open_state, precommand_checks, project_root, state_location};

const VERTEX_API: &str = "aiplatform.googleapis.com";

/// Model subcommands.
#[derive(Subcommand)]
pub enum ModelCommand {
    /// Initialise a model: configure it and create its Vertex AI endpoint
    Init {
        /// Model name (prompted for when omitted)
        name: Option<String>,
    },
    /// Deploy the trained model to its endpoint
    Deploy(DeployArgs),
    /// Undeploy a model, delete its endpoint and forget it
    Remove {
        /// Model name
        name: String,
    },
    /// Print the endpoint resource name of a model
    GetEndpoint {
        /// Model name
        name: String,
    },
    /// List configured models
    List,
    /// Print a model's configuration and state
    Describe {
        /// Model name
        name: String,
    },
}

/// Arguments for `edge model deploy`.
#[derive(Args)]
pub struct DeployArgs {
    /// Model name
    pub name: String,

    /// Vertex AI model to deploy, instead of the one in `models/<name>/vertex_model.json`
    #[arg(long)]
    pub model_resource_name: Option<String>,
}

/// Run the model command.
///
/// # Errors
///
/// Returns unexpected (non-domain) errors.
pub async fn run(app: &AppContext, cmd: ModelCommand) -> Result<ExitCode> {
    match cmd {
        ModelCommand::Init { name } => {
            let tui = CommandTui::begin(
                &app.output,
                "Initialising model on Vertex AI",
                CommandMessages::new("Model initialised successfully", "Model initialisation failed")
                    .with_failure_message("See the errors above. See README for more details."),
            );
            let outcome = init(app, name).await;
            tui.conclude(outcome)
        }
        ModelCommand::Deploy(args) => {
            let mut tui = CommandTui::begin(
                &app.output,
                "Deploying model on Vertex AI",
                CommandMessages::new("Model deployed successfully", "Model deployment failed")
                    .with_failure_message("See the errors above. See README for more details."),
            );
            let outcome = deploy(app, &args).await;
            if let Ok(url) = &outcome {
                tui.messages.success_message = Some(format!(
                    "You can see the deployed model at {url}\n\nHappy herding! 🐏"
                ));
            }
            tui.conclude(outcome)
        }
        ModelCommand::Remove { name } => {
            let tui = CommandTui::begin(
                &app.output,
                &format!("Removing model '{name}' from edge"),
                CommandMessages::new("Model removed successfully", "Model removal failed")
                    .with_failure_message("See the errors above. See README for more details."),
            );
            let outcome = remove(app, &name).await;
            tui.conclude(outcome)
        }
        ModelCommand::GetEndpoint { name } => {
            let tui = CommandTui::silent(&app.output);
            let outcome = get_endpoint(app, &name).await;
            tui.conclude(outcome)
        }
        ModelCommand::List => {
            let tui = CommandTui::silent(&app.output);
            let outcome = list(app);
            tui.conclude(outcome)
        }
        ModelCommand::Describe { name } => {
            let tui = CommandTui::silent(&app.output);
            let outcome = describe(app, &name).await;
            tui.conclude(outcome)
        }
    }
}

async fn init(app: &AppContext, name: Option<String>) -> Result<()> {
    let mut config = app.config_store.load()?;
    precommand_checks(app, &config).await?;
    enable_services(app, &config, &[VERTEX_API]).await?;

    let backend = app.state_backend(&config);
    let store = StateStore::new(&backend, state_location(&config));
    let step = Step::new(&app.output, "⚙️", "Configuring model");
    let mut lease = open_state(&step, &store, AcquireOptions::exclusive()).await?;
    let outcome = configure_model(app, &step, &mut config, &mut lease.state, name).await;
    lease.release(outcome).await?;

    step.sub_step(&format!(
        "Saving configuration to {}",
        app.config_store.path().display()
    ))
    .finish(app.config_store.save(&config))?;
    Ok(())
}

async fn configure_model(
    app: &AppContext,
    step: &Step<'_>,
    config: &mut EdgeConfig,
    state: &mut EdgeState,
    name: Option<String>,
) -> Result<()> {
    let mut sub = step.sub_step_with("Configuring model name", Status::Neutral);
    let chosen = match name {
        Some(name) => Ok(name),
        None => {
            sub.set_dirty();
            let previous = config.models.keys().next().map(String::as_str);
            app.input("Choose a name for your model", previous)
        }
    }
    .and_then(|name| validate_resource_name("model", &name).map(|()| name));
    let name = sub.finish_value(chosen)?;

    let model = config
        .models
        .get(&name)
        .cloned()
        .unwrap_or_else(|| ModelConfig::for_name(name.clone()));
    let provider = EndpointProvider::new(&app.runner, AppContext::project(config));
    let region = config.google_cloud_project.region.clone();

    let mut sub = step.sub_step(&format!(
        "Configuring Vertex AI endpoint '{}'",
        model.endpoint_name
    ));
    let ensured = reconcile::ensure(&provider, &mut sub, &model.endpoint_name, &region).await;
    let endpoint = sub.finish_value(ensured)?.into_descriptor();

    // A redeployed endpoint keeps serving what it served; a new one serves nothing.
    let deployed_model_id = state
        .models
        .get(&name)
        .filter(|m| m.endpoint_resource_name == endpoint)
        .and_then(|m| m.deployed_model_id.clone());
    state.models.insert(
        name.clone(),
        ModelState {
            endpoint_resource_name: endpoint,
            deployed_model_id,
        },
    );
    config.models.insert(name, model);
    Ok(())
}

async fn deploy(app: &AppContext, args: &DeployArgs) -> Result<String> {
    let config = app.config_store.load()?;
    precommand_checks(app, &config).await?;

    let backend = app.state_backend(&config);
    let store = StateStore::new(&backend, state_location(&config));
    let step = Step::new(&app.output, "🐏", "Checking model configuration");
    let mut lease = open_state(&step, &store, AcquireOptions::exclusive()).await?;
    let outcome = deploy_model(app, &step, &config, &mut lease.state, args).await;
    lease.release(outcome).await
}

async fn deploy_model(
    app: &AppContext,
    step: &Step<'_>,
    config: &EdgeConfig,
    state: &mut EdgeState,
    args: &DeployArgs,
) -> Result<String> {
    let name = &args.name;
    step.sub_step("Checking that the model is initialised")
        .finish(config.model(name).and_then(|_| state.model(name).map(|_| ())))?;

    let sub = step.sub_step("Checking that the model has been trained");
    let trained = match &args.model_resource_name {
        Some(resource) => Ok(resource.clone()),
        None => read_trained_model(&project_root(app), name),
    };
    let model_resource_name = sub.finish_value(trained)?;

    let model_state = state.model_mut(name)?;
    let endpoint = model_state.endpoint_resource_name.clone();
    let serving = VertexServing::new(&app.runner, AppContext::project(config));
    let deploy_step = Step::new(&app.output, "🚀", "Deploying model on Vertex AI");
    let sub = deploy_step.sub_step(&format!(
        "Deploying '{model_resource_name}' to '{endpoint}'"
    ));
    sub.finish(models::deploy(&serving, model_state, &model_resource_name, name).await)?;

    Ok(endpoint_console_url(
        &endpoint,
        &config.google_cloud_project.project_id,
    ))
}

async fn remove(app: &AppContext, name: &str) -> Result<()> {
    let mut config = app.config_store.load()?;
    precommand_checks(app, &config).await?;

    let backend = app.state_backend(&config);
    let store = StateStore::new(&backend, state_location(&config));
    let step = Step::new(
        &app.output,
        "🐏",
        &format!("Checking model '{name}' configuration and state"),
    );
    let mut lease = open_state(&step, &store, AcquireOptions::exclusive()).await?;
    let outcome = remove_model(app, &step, &mut config, &mut lease.state, name).await;
    lease.release(outcome).await?;

    step.sub_step(&format!(
        "Saving configuration to {}",
        app.config_store.path().display()
    ))
    .finish(app.config_store.save(&config))?;
    Ok(())
}

async fn remove_model(
    app: &AppContext,
    step: &Step<'_>,
    config: &mut EdgeConfig,
    state: &mut EdgeState,
    name: &str,
) -> Result<()> {
    step.sub_step(&format!("Checking model '{name}' configuration"))
        .finish(if config.models.contains_key(name) {
            Ok(())
        } else {
            Err(DomainError::new(format!(
                "'{name}' model is not in `edge.yaml` configuration, so it cannot be removed."
            ))
            .into())
        })?;
    let sub = step.sub_step(&format!("Checking model '{name}' state"));
    let endpoint = sub.finish_value(
        state
            .models
            .get(name)
            .map(|m| m.endpoint_resource_name.clone())
            .ok_or_else(|| {
                DomainError::new(format!(
                    "'{name}' is not in edge state, which suggests that it has not been \
                     initialised. Cannot be removed."
                ))
                .into()
            }),
    )?;

    let mut sub = step.sub_step_with("Confirming action", Status::Warning);
    sub.add_explanation(&format!(
        "This action will undeploy '{name}' model from Vertex AI, delete the Vertex AI endpoint \
         associated with '{name}' model, and remove '{name}' model from edge config and state."
    ));
    sub.set_dirty();
    let confirmed = app.confirm("Do you want to continue?", false).and_then(|yes| {
        if yes {
            Ok(())
        } else {
            Err(DomainError::new("Canceled by user").into())
        }
    });
    sub.finish(confirmed)?;

    let serving = VertexServing::new(&app.runner, AppContext::project(config));
    let removal = Step::new(&app.output, "🗑️", &format!("Removing '{name}' model"));
    removal
        .sub_step(&format!("Deleting '{endpoint}' endpoint"))
        .finish(models::tear_down_endpoint(&serving, &endpoint).await)?;
    let sub = removal.sub_step(&format!("Removing '{name}' model from config and state"));
    config.models.remove(name);
    state.models.remove(name);
    sub.finish(Ok(()))?;
    Ok(())
}

async fn get_endpoint(app: &AppContext, name: &str) -> Result<()> {
    let config = app.config_store.load()?;
    config.model(name)?;
    let backend = app.state_backend(&config);
    let store = StateStore::new(&backend, state_location(&config));
    let step = Step::silent(&app.output);
    let lease = open_state(&step, &store, AcquireOptions::read_only()).await?;
    let endpoint = lease
        .state
        .model(name)
        .map(|m| m.endpoint_resource_name.clone());
    let endpoint = lease.release(endpoint).await?;
    app.output.value(&endpoint);
    Ok(())
}

fn list(app: &AppContext) -> Result<()> {
    let config = app.config_store.load()?;
    app.output.value("Configured models:");
    for name in config.models.keys() {
        app.output.value(&format!(" - {name}"));
    }
    Ok(())
}

#[derive(Serialize)]
struct Description<'a> {
    config: &'a ModelConfig,
    state: &'a ModelState,
}

async fn describe(app: &AppContext, name: &str) -> Result<()> {
    let config = app.config_store.load()?;
    let model = config.model(name)?;
    let backend = app.state_backend(&config);
    let store = StateStore::new(&backend, state_location(&config));
    let step = Step::silent(&app.output);
    let lease = open_state(&step, &store, AcquireOptions::read_only()).await?;
    let rendered = lease.state.model(name).and_then(|state| {
        serde_yaml::to_string(&Description {
            config: model,
            state,
        })
        .map_err(Into::into)
    });
    let rendered = lease.release(rendered).await?;
    app.output.value(rendered.trim_end());
    Ok(())
}
