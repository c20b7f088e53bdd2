//! Application service: checks run before every command that talks to Google Cloud.

use anyhow::Result;

use crate::application::ports::CloudEnvironment;
use crate::domain::error::DomainError;

/// Both user and application-default credentials must be present.
///
/// # Errors
///
/// Returns the environment's fatal `DomainError` with the login command.
pub async fn check_authenticated(env: &impl CloudEnvironment) -> Result<()> {
    env.check_authenticated().await
}

/// # Errors
///
/// Returns a fatal `DomainError` if the project cannot be found.
pub async fn check_project_exists(env: &impl CloudEnvironment, project_id: &str) -> Result<()> {
    if env.project_exists(project_id).await? {
        Ok(())
    } else {
        Err(DomainError::new(format!(
            "Project '{project_id}' does not exist or you do not have access to it. \
             Check `google_cloud_project.project_id` in your configuration."
        ))
        .into())
    }
}

/// Billing must be enabled. Failing to find out is only a warning.
///
/// # Errors
///
/// Fatal `DomainError` when billing is disabled; non-fatal `DomainError` when
/// the billing status cannot be determined.
pub async fn check_billing(env: &impl CloudEnvironment, project_id: &str) -> Result<()> {
    match env.billing_enabled(project_id).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(DomainError::new(format!(
            "Billing is not enabled for project '{project_id}'. Please enable billing for this project \
             following these instructions https://cloud.google.com/billing/docs/how-to/modify-project"
        ))
        .into()),
        Err(err) => {
            tracing::debug!(error = %err, "billing lookup failed");
            Err(DomainError::warning(format!(
                "Unable to check if billing is enabled for project '{project_id}'. \
                 Make sure it is, or provisioning will fail later."
            ))
            .into())
        }
    }
}
