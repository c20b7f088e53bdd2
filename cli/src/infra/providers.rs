//! `ResourceProvider` adapters over the gcloud CLI.
//!
//! Each provider only looks resources up and creates them; everything else
//! about a resource lives in its own port.

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::application::ports::{CommandRunner, ResourceProvider, SecretVersions};
use crate::domain::error::ProviderError;
use crate::domain::state::bucket_path;
use crate::domain::{ClusterDescriptor, ResourceKind};
use crate::infra::exec::{run_checked, run_checked_with_stdin};

/// Project coordinates shared by every provider.
#[derive(Debug, Clone)]
pub struct GcpProject {
    pub project_id: String,
    pub region: String,
}

impl GcpProject {
    #[must_use]
    pub fn new(project_id: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            region: region.into(),
        }
    }
}

/// A failed describe that means "no such resource" rather than a real error.
fn is_not_found(err: &anyhow::Error) -> bool {
    match err.downcast_ref::<ProviderError>() {
        Some(ProviderError::CommandFailed { detail, .. }) => {
            detail.contains("NOT_FOUND")
                || detail.contains("not found")
                || detail.contains("HTTPError 404")
        }
        _ => false,
    }
}

fn non_empty_lines(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

// ── Storage bucket ───────────────────────────────────────────────────────────

/// Cloud Storage buckets. Descriptor is the canonical `gs://<name>/` path.
pub struct BucketProvider<R: CommandRunner> {
    runner: R,
    project: GcpProject,
}

impl<R: CommandRunner> BucketProvider<R> {
    pub fn new(runner: R, project: GcpProject) -> Self {
        Self { runner, project }
    }
}

impl<R: CommandRunner> ResourceProvider for BucketProvider<R> {
    type Descriptor = String;

    fn kind(&self) -> ResourceKind {
        ResourceKind::StorageBucket
    }

    async fn find(&self, name: &str) -> Result<Vec<String>> {
        let url = format!("gs://{name}");
        match run_checked(
            &self.runner,
            "gcloud",
            &[
                "storage",
                "buckets",
                "describe",
                &url,
                "--project",
                &self.project.project_id,
                "--format=value(name)",
            ],
        )
        .await
        {
            Ok(found) => Ok(non_empty_lines(&found)
                .iter()
                .map(|n| bucket_path(n))
                .collect()),
            Err(e) if is_not_found(&e) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    async fn create(&self, name: &str, location: &str) -> Result<String> {
        let url = format!("gs://{name}");
        run_checked(
            &self.runner,
            "gcloud",
            &[
                "storage",
                "buckets",
                "create",
                &url,
                "--project",
                &self.project.project_id,
                "--location",
                location,
            ],
        )
        .await?;
        Ok(bucket_path(name))
    }
}

// ── Vertex AI endpoint ───────────────────────────────────────────────────────

/// Vertex AI endpoints, looked up by display name.
/// Descriptor is the full resource name (`projects/../endpoints/<id>`).
pub struct EndpointProvider<R: CommandRunner> {
    runner: R,
    project: GcpProject,
}

impl<R: CommandRunner> EndpointProvider<R> {
    pub fn new(runner: R, project: GcpProject) -> Self {
        Self { runner, project }
    }
}

impl<R: CommandRunner> ResourceProvider for EndpointProvider<R> {
    type Descriptor = String;

    fn kind(&self) -> ResourceKind {
        ResourceKind::Endpoint
    }

    async fn find(&self, name: &str) -> Result<Vec<String>> {
        let filter = format!("--filter=display_name={name}");
        let found = run_checked(
            &self.runner,
            "gcloud",
            &[
                "ai",
                "endpoints",
                "list",
                "--project",
                &self.project.project_id,
                "--region",
                &self.project.region,
                &filter,
                "--format=value(name)",
            ],
        )
        .await?;
        Ok(non_empty_lines(&found))
    }

    async fn create(&self, name: &str, location: &str) -> Result<String> {
        let display_name = format!("--display-name={name}");
        let created = run_checked(
            &self.runner,
            "gcloud",
            &[
                "ai",
                "endpoints",
                "create",
                "--project",
                &self.project.project_id,
                "--region",
                location,
                &display_name,
                "--format=value(name)",
            ],
        )
        .await?;
        non_empty_lines(&created)
            .pop()
            .context("`gcloud ai endpoints create` did not print the endpoint name")
    }
}

// ── GKE cluster ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ClusterListing {
    name: String,
    location: String,
}

/// GKE Autopilot clusters.
pub struct ClusterProvider<R: CommandRunner> {
    runner: R,
    project: GcpProject,
}

impl<R: CommandRunner> ClusterProvider<R> {
    pub fn new(runner: R, project: GcpProject) -> Self {
        Self { runner, project }
    }
}

impl<R: CommandRunner> ResourceProvider for ClusterProvider<R> {
    type Descriptor = ClusterDescriptor;

    fn kind(&self) -> ResourceKind {
        ResourceKind::Cluster
    }

    async fn find(&self, name: &str) -> Result<Vec<ClusterDescriptor>> {
        let filter = format!("--filter=name={name}");
        let raw = run_checked(
            &self.runner,
            "gcloud",
            &[
                "container",
                "clusters",
                "list",
                "--project",
                &self.project.project_id,
                &filter,
                "--format=json",
            ],
        )
        .await?;
        let listing: Vec<ClusterListing> =
            serde_json::from_str(&raw).context("cannot parse cluster list")?;
        Ok(listing
            .into_iter()
            .filter(|c| c.name == name)
            .map(|c| ClusterDescriptor {
                name: c.name,
                location: c.location,
            })
            .collect())
    }

    async fn create(&self, name: &str, location: &str) -> Result<ClusterDescriptor> {
        run_checked(
            &self.runner,
            "gcloud",
            &[
                "container",
                "clusters",
                "create-auto",
                name,
                "--project",
                &self.project.project_id,
                "--region",
                location,
            ],
        )
        .await?;
        Ok(ClusterDescriptor {
            name: name.to_string(),
            location: location.to_string(),
        })
    }
}

// ── Secret Manager ───────────────────────────────────────────────────────────

/// Secret Manager secrets. Descriptor is `projects/<n>/secrets/<id>`.
pub struct SecretProvider<R: CommandRunner> {
    runner: R,
    project: GcpProject,
}

impl<R: CommandRunner> SecretProvider<R> {
    pub fn new(runner: R, project: GcpProject) -> Self {
        Self { runner, project }
    }
}

impl<R: CommandRunner> ResourceProvider for SecretProvider<R> {
    type Descriptor = String;

    fn kind(&self) -> ResourceKind {
        ResourceKind::Secret
    }

    async fn find(&self, name: &str) -> Result<Vec<String>> {
        match run_checked(
            &self.runner,
            "gcloud",
            &[
                "secrets",
                "describe",
                name,
                "--project",
                &self.project.project_id,
                "--format=value(name)",
            ],
        )
        .await
        {
            Ok(found) => Ok(non_empty_lines(&found)),
            Err(e) if is_not_found(&e) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    /// Secrets are replicated automatically; `location` is not used.
    async fn create(&self, name: &str, _location: &str) -> Result<String> {
        let created = run_checked(
            &self.runner,
            "gcloud",
            &[
                "secrets",
                "create",
                name,
                "--project",
                &self.project.project_id,
                "--replication-policy=automatic",
                "--format=value(name)",
            ],
        )
        .await?;
        non_empty_lines(&created)
            .pop()
            .context("`gcloud secrets create` did not print the secret name")
    }
}

impl<R: CommandRunner> SecretVersions for SecretProvider<R> {
    async fn add_version(&self, secret_id: &str, payload: &str) -> Result<()> {
        run_checked_with_stdin(
            &self.runner,
            "gcloud",
            &[
                "secrets",
                "versions",
                "add",
                secret_id,
                "--project",
                &self.project.project_id,
                "--data-file=-",
            ],
            payload.as_bytes(),
        )
        .await
        .map(|_| ())
    }

    async fn latest(&self, secret_id: &str) -> Result<String> {
        let secret = format!("--secret={secret_id}");
        run_checked(
            &self.runner,
            "gcloud",
            &[
                "secrets",
                "versions",
                "access",
                "latest",
                &secret,
                "--project",
                &self.project.project_id,
            ],
        )
        .await
    }
}
