//! `gcloud`, `kubectl` and `helm` environment checks (`CloudEnvironment` port).

use anyhow::{Context, Result};
use serde_json::Value;

use crate::application::ports::{CloudEnvironment, CommandRunner, GcloudSetting, Tool};
use crate::domain::error::{DomainError, ProviderError};
use crate::domain::Version;
use crate::infra::exec::{run_checked, run_succeeds};

/// Routes environment checks through a `CommandRunner`.
pub struct GcloudEnvironment<R: CommandRunner> {
    runner: R,
}

impl<R: CommandRunner> GcloudEnvironment<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    async fn require_installed(&self, program: &str, install_url: &str) -> Result<()> {
        if self.runner.run(program, &["--help"]).await.is_ok() {
            Ok(())
        } else {
            Err(DomainError::new(format!(
                "Unable to locate {program}. Please visit {install_url} for installation instructions."
            ))
            .into())
        }
    }

    async fn gcloud_components(&self) -> Result<Value> {
        self.require_installed("gcloud", "https://cloud.google.com/sdk/docs/install")
            .await?;
        let raw = run_checked(&self.runner, "gcloud", &["version", "--format", "json"]).await?;
        serde_json::from_str(&raw).context("cannot parse `gcloud version` output")
    }
}

/// Extract a component version from `gcloud version --format json`.
fn component_version(components: &Value, key: &str) -> Option<Result<Version>> {
    components
        .get(key)
        .and_then(Value::as_str)
        .map(Version::parse)
}

/// `kubectl version --client -o json` → `clientVersion.gitVersion`.
fn kubectl_version(raw: &str) -> Result<Version> {
    let parsed: Value = serde_json::from_str(raw).context("cannot parse `kubectl version` output")?;
    let git_version = parsed
        .pointer("/clientVersion/gitVersion")
        .and_then(Value::as_str)
        .context("`kubectl version` output has no clientVersion.gitVersion")?;
    Version::parse(git_version)
}

/// gcloud prints `(unset)` on stderr and nothing on stdout for unset properties.
fn normalise_setting(raw: &str) -> Option<String> {
    let value = raw.trim();
    if value.is_empty() || value == "(unset)" {
        None
    } else {
        Some(value.to_string())
    }
}

impl<R: CommandRunner> CloudEnvironment for GcloudEnvironment<R> {
    async fn tool_version(&self, tool: Tool) -> Result<Version> {
        match tool {
            Tool::Gcloud => {
                let components = self.gcloud_components().await?;
                component_version(&components, "core")
                    .context("`gcloud version` did not report a core version")?
            }
            Tool::GcloudAlpha => {
                let components = self.gcloud_components().await?;
                match component_version(&components, "alpha") {
                    Some(version) => version,
                    None => Err(DomainError::new(
                        "gcloud alpha component is not installed. Run `gcloud components install alpha`.",
                    )
                    .into()),
                }
            }
            Tool::Kubectl => {
                self.require_installed("kubectl", "https://kubernetes.io/docs/tasks/tools/")
                    .await?;
                let raw = run_checked(
                    &self.runner,
                    "kubectl",
                    &["version", "--client=true", "-o", "json"],
                )
                .await?;
                kubectl_version(&raw)
            }
            Tool::Helm => {
                self.require_installed("helm", "https://helm.sh/docs/intro/install/")
                    .await?;
                let raw = run_checked(&self.runner, "helm", &["version", "--short"]).await?;
                Version::parse(&raw)
            }
        }
    }

    async fn check_authenticated(&self) -> Result<()> {
        let accounts = run_checked(
            &self.runner,
            "gcloud",
            &["auth", "list", "--filter=status:ACTIVE", "--format=value(account)"],
        )
        .await?;
        if accounts.is_empty() {
            return Err(DomainError::new(
                "You are not authenticated with gcloud. Run `gcloud auth login`.",
            )
            .into());
        }
        let adc = run_succeeds(
            &self.runner,
            "gcloud",
            &["auth", "application-default", "print-access-token"],
        )
        .await?;
        if !adc {
            return Err(DomainError::new(
                "Application default credentials are missing. Run `gcloud auth application-default login`.",
            )
            .into());
        }
        Ok(())
    }

    async fn setting(&self, setting: GcloudSetting) -> Result<Option<String>> {
        let property = match setting {
            GcloudSetting::Account => "account",
            GcloudSetting::Project => "project",
            GcloudSetting::Region => "compute/region",
        };
        let raw = run_checked(&self.runner, "gcloud", &["config", "get-value", property]).await?;
        Ok(normalise_setting(&raw))
    }

    async fn project_exists(&self, project_id: &str) -> Result<bool> {
        run_succeeds(
            &self.runner,
            "gcloud",
            &["projects", "describe", project_id, "--format=value(projectId)"],
        )
        .await
    }

    async fn billing_enabled(&self, project_id: &str) -> Result<bool> {
        let raw = run_checked(
            &self.runner,
            "gcloud",
            &[
                "beta",
                "billing",
                "projects",
                "describe",
                project_id,
                "--format=value(billingEnabled)",
            ],
        )
        .await?;
        Ok(raw.eq_ignore_ascii_case("true"))
    }

    async fn is_service_enabled(&self, project_id: &str, service: &str) -> Result<bool> {
        let raw = run_checked(
            &self.runner,
            "gcloud",
            &[
                "services",
                "list",
                "--enabled",
                "--project",
                project_id,
                "--format=value(config.name)",
            ],
        )
        .await
        .map_err(|e| service_error(service, e))?;
        Ok(raw.lines().any(|line| line.trim() == service))
    }

    async fn enable_service(&self, project_id: &str, service: &str) -> Result<()> {
        run_checked(
            &self.runner,
            "gcloud",
            &["services", "enable", service, "--project", project_id],
        )
        .await
        .map(|_| ())
        .map_err(|e| service_error(service, e))
    }
}

fn service_error(service: &str, err: anyhow::Error) -> anyhow::Error {
    match err.downcast_ref::<ProviderError>() {
        Some(ProviderError::PermissionDenied { .. }) => DomainError::new(format!(
            "Service '{service}' cannot be enabled because you have insufficient permissions on Google Cloud"
        ))
        .into(),
        _ => err,
    }
}
