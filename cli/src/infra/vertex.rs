//! Vertex AI endpoint operations (`ModelServing` port).

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::application::ports::{CommandRunner, ModelServing};
use crate::infra::exec::run_checked;
use crate::infra::providers::GcpProject;

/// Machine type every deployed model is served on.
pub const MACHINE_TYPE: &str = "n1-standard-2";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EndpointDescription {
    #[serde(default)]
    deployed_models: Vec<DeployedModel>,
}

#[derive(Deserialize)]
struct DeployedModel {
    id: String,
}

/// `gcloud ai endpoints ...` adapter.
pub struct VertexServing<R: CommandRunner> {
    runner: R,
    project: GcpProject,
}

impl<R: CommandRunner> VertexServing<R> {
    pub fn new(runner: R, project: GcpProject) -> Self {
        Self { runner, project }
    }

    async fn deployed_model_ids(&self, endpoint: &str) -> Result<Vec<String>> {
        let raw = run_checked(
            &self.runner,
            "gcloud",
            &[
                "ai",
                "endpoints",
                "describe",
                endpoint,
                "--project",
                &self.project.project_id,
                "--region",
                &self.project.region,
                "--format=json",
            ],
        )
        .await?;
        let description: EndpointDescription =
            serde_json::from_str(&raw).context("cannot parse endpoint description")?;
        Ok(description
            .deployed_models
            .into_iter()
            .map(|m| m.id)
            .collect())
    }
}

impl<R: CommandRunner> ModelServing for VertexServing<R> {
    async fn deploy_model(
        &self,
        endpoint: &str,
        model_resource_name: &str,
        display_name: &str,
    ) -> Result<String> {
        let model = format!("--model={model_resource_name}");
        let display = format!("--display-name={display_name}");
        let machine = format!("--machine-type={MACHINE_TYPE}");
        let deployed = run_checked(
            &self.runner,
            "gcloud",
            &[
                "ai",
                "endpoints",
                "deploy-model",
                endpoint,
                "--project",
                &self.project.project_id,
                "--region",
                &self.project.region,
                &model,
                &display,
                &machine,
                "--traffic-split=0=100",
                "--format=value(deployedModel.id)",
            ],
        )
        .await?;
        deployed
            .lines()
            .map(str::trim)
            .rfind(|l| !l.is_empty())
            .map(str::to_string)
            .context("`gcloud ai endpoints deploy-model` did not print the deployed model id")
    }

    async fn undeploy_all(&self, endpoint: &str) -> Result<()> {
        for id in self.deployed_model_ids(endpoint).await? {
            tracing::debug!(endpoint, id, "undeploying model");
            let deployed = format!("--deployed-model-id={id}");
            run_checked(
                &self.runner,
                "gcloud",
                &[
                    "ai",
                    "endpoints",
                    "undeploy-model",
                    endpoint,
                    "--project",
                    &self.project.project_id,
                    "--region",
                    &self.project.region,
                    &deployed,
                ],
            )
            .await?;
        }
        Ok(())
    }

    async fn delete_endpoint(&self, endpoint: &str) -> Result<()> {
        run_checked(
            &self.runner,
            "gcloud",
            &[
                "ai",
                "endpoints",
                "delete",
                endpoint,
                "--project",
                &self.project.project_id,
                "--region",
                &self.project.region,
                "--quiet",
            ],
        )
        .await
        .map(|_| ())
    }
}
