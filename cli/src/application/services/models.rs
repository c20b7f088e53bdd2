//! Application service: model endpoints: deploy and tear down.
//!
//! Endpoint creation itself goes through the reconciler.

use anyhow::Result;

use crate::application::ports::ModelServing;
use crate::domain::state::ModelState;

/// Replace whatever is deployed on the model's endpoint with `model_resource_name`.
///
/// Records the new deployed model id in `model_state`.
///
/// # Errors
///
/// Returns the first failing provider call.
pub async fn deploy(
    serving: &impl ModelServing,
    model_state: &mut ModelState,
    model_resource_name: &str,
    display_name: &str,
) -> Result<String> {
    let endpoint = &model_state.endpoint_resource_name;
    serving.undeploy_all(endpoint).await?;
    model_state.deployed_model_id = None;
    let deployed = serving
        .deploy_model(endpoint, model_resource_name, display_name)
        .await?;
    tracing::debug!(endpoint, deployed, "model deployed");
    model_state.deployed_model_id = Some(deployed.clone());
    Ok(deployed)
}

/// Undeploy everything from the endpoint and delete it.
///
/// # Errors
///
/// Returns the first failing provider call.
pub async fn tear_down_endpoint(serving: &impl ModelServing, endpoint: &str) -> Result<()> {
    serving.undeploy_all(endpoint).await?;
    serving.delete_endpoint(endpoint).await
}
