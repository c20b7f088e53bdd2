//! Application service: local tooling and Google Cloud project checks.
//!
//! Each function is one unit of work; the command layer wraps them in SubSteps.

use anyhow::Result;

use crate::application::ports::{CloudEnvironment, GcloudSetting, Tool};
use crate::domain::error::DomainError;
use crate::domain::regions::{SUPPORTED_REGIONS, is_supported_region};
use crate::domain::Version;

/// Minimum tool versions `edge` is tested against.
pub const MIN_GCLOUD: Version = Version::new(2021, 5, 21);
pub const MIN_GCLOUD_ALPHA: Version = Version::new(2021, 7, 19);
pub const MIN_KUBECTL: Version = Version::new(1, 19, 0);
pub const MIN_HELM: Version = Version::new(3, 5, 2);

/// gcloud account, project and region, as configured in the gcloud CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GcloudSettings {
    pub account: String,
    pub project: String,
    pub region: String,
}

/// Check that `tool` is installed at `minimum` or newer.
///
/// # Errors
///
/// Returns a fatal `DomainError` naming the found and required versions.
pub async fn check_tool_version(
    env: &impl CloudEnvironment,
    tool: Tool,
    minimum: Version,
) -> Result<Version> {
    let found = env.tool_version(tool).await?;
    if found.is_at_least(minimum) {
        return Ok(found);
    }
    let hint = match tool {
        Tool::Gcloud | Tool::GcloudAlpha => "Update gcloud by running `gcloud components update`.",
        Tool::Kubectl => "Please visit https://kubernetes.io/docs/tasks/tools/ for installation instructions.",
        Tool::Helm => "Please visit https://helm.sh/docs/intro/install/ for installation instructions.",
    };
    Err(DomainError::new(format!(
        "We found {} version {found}, but we require at least {minimum}. {hint}",
        tool_name(tool)
    ))
    .into())
}

fn tool_name(tool: Tool) -> &'static str {
    match tool {
        Tool::Gcloud => "gcloud",
        Tool::GcloudAlpha => "gcloud alpha component",
        Tool::Kubectl => "kubectl",
        Tool::Helm => "helm",
    }
}

/// Read account, project and region from gcloud, failing on the first unset one.
///
/// # Errors
///
/// Returns a fatal `DomainError` with the gcloud command that fixes it.
pub async fn read_gcloud_settings(env: &impl CloudEnvironment) -> Result<GcloudSettings> {
    let account = required_setting(
        env,
        GcloudSetting::Account,
        "gcloud account is unset. Run `gcloud auth login && gcloud auth application-default login` \
         to authenticate with the correct account",
    )
    .await?;
    let project = required_setting(
        env,
        GcloudSetting::Project,
        "gcloud project id is unset. Run `gcloud config set project $PROJECT_ID` to set the correct project id",
    )
    .await?;
    let region = required_setting(
        env,
        GcloudSetting::Region,
        "gcloud region is unset. Run `gcloud config set compute/region $REGION` to set the correct region",
    )
    .await?;
    Ok(GcloudSettings {
        account,
        project,
        region,
    })
}

async fn required_setting(
    env: &impl CloudEnvironment,
    setting: GcloudSetting,
    message: &str,
) -> Result<String> {
    match env.setting(setting).await? {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(DomainError::new(message).into()),
    }
}

/// Check that `region` supports Vertex AI.
///
/// # Errors
///
/// Returns a fatal `DomainError` listing the supported regions.
pub fn check_region(region: &str) -> Result<()> {
    if is_supported_region(region) {
        return Ok(());
    }
    Err(DomainError::new(format!(
        "Vertex AI only works in certain regions. Please choose one of the following by running \
         `gcloud config set compute/region <region>`:\n      {}",
        SUPPORTED_REGIONS.join("\n      ")
    ))
    .into())
}

/// Enable a Google Cloud API if it is not enabled yet.
///
/// # Errors
///
/// Returns the provider error (permission failures are already fatal domain errors).
pub async fn ensure_service_enabled(
    env: &impl CloudEnvironment,
    project_id: &str,
    service: &str,
) -> Result<()> {
    if env.is_service_enabled(project_id, service).await? {
        tracing::debug!(service, "service already enabled");
        return Ok(());
    }
    env.enable_service(project_id, service).await
}
