//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`, never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::Path;
use std::process::Output;

use anyhow::Result;

use crate::domain::{ClusterDescriptor, EdgeConfig, ResourceKind, Status, Version};

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program to completion and capture its output.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with stdin piped from `stdin`.
    async fn run_with_stdin(&self, program: &str, args: &[&str], stdin: &[u8]) -> Result<Output>;
}

impl<R: CommandRunner> CommandRunner for &R {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        (**self).run(program, args).await
    }

    async fn run_with_stdin(&self, program: &str, args: &[&str], stdin: &[u8]) -> Result<Output> {
        (**self).run_with_stdin(program, args, stdin).await
    }
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// The handle a unit of work uses to describe itself while it runs.
///
/// Implemented by the presentation layer's SubStep. Sync trait.
pub trait ProgressReporter {
    /// Replace the displayed message and/or status.
    fn update(&mut self, message: Option<&str>, status: Option<Status>);
    /// Attach a rationale line below the message. Marks the reporter dirty.
    fn add_explanation(&mut self, text: &str);
    /// Stop overwriting the current line; later output is appended below it.
    fn set_dirty(&mut self);
}

// ── Object Store Port ─────────────────────────────────────────────────────────

/// A keyed blob store bound to one storage location (a bucket).
#[allow(async_fn_in_trait)]
pub trait ObjectStore {
    /// Human-readable location, e.g. `gs://bucket`.
    fn location(&self) -> String;
    /// Whether the storage location itself exists.
    async fn location_exists(&self) -> Result<bool>;
    /// Whether an object exists under `key`.
    async fn exists(&self, key: &str) -> Result<bool>;
    /// Read the full content of `key`.
    async fn read(&self, key: &str) -> Result<Vec<u8>>;
    /// Overwrite `key` unconditionally.
    async fn write(&self, key: &str, bytes: &[u8]) -> Result<()>;
    /// Create `key` only if it does not exist. Returns `false` when it already did.
    async fn create_new(&self, key: &str, bytes: &[u8]) -> Result<bool>;
    /// Delete `key`. Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;
}

// ── Resource Provider Port ────────────────────────────────────────────────────

/// Existence lookup and creation for one kind of cloud resource.
///
/// The reconciler never calls anything else on a provider.
#[allow(async_fn_in_trait)]
pub trait ResourceProvider {
    /// Canonical identifier (or small record) of a resource.
    type Descriptor: Clone;

    fn kind(&self) -> ResourceKind;
    /// All resources matching the lookup key. Usually zero or one.
    async fn find(&self, name: &str) -> Result<Vec<Self::Descriptor>>;
    /// Create the resource in `location` and return its descriptor.
    async fn create(&self, name: &str, location: &str) -> Result<Self::Descriptor>;
}

// ── Configuration Port ────────────────────────────────────────────────────────

/// Abstracts loading and saving `edge.yaml`.
pub trait ConfigStore {
    fn path(&self) -> &Path;
    fn exists(&self) -> bool;
    /// Load and validate the configuration.
    fn load(&self) -> Result<EdgeConfig>;
    fn save(&self, config: &EdgeConfig) -> Result<()>;
}

// ── Cloud Environment Port ────────────────────────────────────────────────────

/// External tools whose versions are checked before `init`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Gcloud,
    GcloudAlpha,
    Kubectl,
    Helm,
}

/// gcloud CLI properties read during `init`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GcloudSetting {
    Account,
    Project,
    Region,
}

/// Local tooling and Google Cloud project checks.
#[allow(async_fn_in_trait)]
pub trait CloudEnvironment {
    /// Installed version of `tool`. A missing tool is a fatal domain error.
    async fn tool_version(&self, tool: Tool) -> Result<Version>;
    /// Succeeds when both user and application-default credentials are present.
    async fn check_authenticated(&self) -> Result<()>;
    /// Value of a gcloud property, `None` when unset.
    async fn setting(&self, setting: GcloudSetting) -> Result<Option<String>>;
    async fn project_exists(&self, project_id: &str) -> Result<bool>;
    async fn billing_enabled(&self, project_id: &str) -> Result<bool>;
    async fn is_service_enabled(&self, project_id: &str, service: &str) -> Result<bool>;
    async fn enable_service(&self, project_id: &str, service: &str) -> Result<()>;
}

// ── Model Serving Port ────────────────────────────────────────────────────────

/// Vertex AI endpoint operations beyond find/create.
#[allow(async_fn_in_trait)]
pub trait ModelServing {
    /// Deploy `model_resource_name` to `endpoint` with all traffic. Returns the deployed model id.
    async fn deploy_model(
        &self,
        endpoint: &str,
        model_resource_name: &str,
        display_name: &str,
    ) -> Result<String>;
    /// Undeploy every model currently deployed to `endpoint`.
    async fn undeploy_all(&self, endpoint: &str) -> Result<()>;
    async fn delete_endpoint(&self, endpoint: &str) -> Result<()>;
}

// ── Experiment Tracker Port ───────────────────────────────────────────────────

/// Kubernetes-side installation of the experiment tracker.
#[allow(async_fn_in_trait)]
pub trait ExperimentTracker {
    /// Point kubectl/helm at `cluster`.
    async fn get_credentials(&self, cluster: &ClusterDescriptor) -> Result<()>;
    async fn is_mongodb_installed(&self) -> Result<bool>;
    async fn install_mongodb(&self) -> Result<()>;
    async fn is_service_exposed(&self, service: &str) -> Result<bool>;
    async fn expose_mongodb(&self) -> Result<()>;
    async fn mongodb_password(&self) -> Result<String>;
    /// External address of a LoadBalancer service, `None` while still pending.
    async fn load_balancer_ip(&self, service: &str) -> Result<Option<String>>;
    /// Replace the in-cluster secret holding the internal connection string.
    async fn store_connection_secret(&self, internal_connection_string: &str) -> Result<()>;
    async fn install_omniboard(&self) -> Result<()>;
}

// ── Secret Versions Port ──────────────────────────────────────────────────────

/// Secret payload operations beyond find/create.
#[allow(async_fn_in_trait)]
pub trait SecretVersions {
    async fn add_version(&self, secret_id: &str, payload: &str) -> Result<()>;
    async fn latest(&self, secret_id: &str) -> Result<String>;
}

// ── DVC Port ──────────────────────────────────────────────────────────────────

/// Data version control repository in the working directory.
#[allow(async_fn_in_trait)]
pub trait DvcRepository {
    fn is_initialised(&self) -> bool;
    async fn init(&self) -> Result<()>;
    /// URL of the remote called `name`, if configured.
    async fn remote_url(&self, name: &str) -> Result<Option<String>>;
    /// Add remote `name` and make it the default.
    async fn add_remote(&self, name: &str, url: &str) -> Result<()>;
    /// Point the existing remote `name` at `url` and make it the default.
    async fn modify_remote(&self, name: &str, url: &str) -> Result<()>;
    /// Remove DVC metadata so the repository can be initialised from scratch.
    fn destroy(&self) -> Result<()>;
}
