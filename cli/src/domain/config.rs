//! Domain types and validators for the project configuration (`edge.yaml`).
//!
//! Pure functions only, without I/O.

use std::collections::BTreeMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;
use crate::domain::regions::is_supported_region;

// ── Constants ────────────────────────────────────────────────────────────────

pub const DEFAULT_DVC_STORE_DIRECTORY: &str = "dvcstore";
pub const DEFAULT_VERTEX_JOBS_DIRECTORY: &str = "vertex";
pub const DEFAULT_GKE_CLUSTER_NAME: &str = "sacred";
pub const DEFAULT_MONGODB_SECRET: &str = "sacred-mongodb-connection-string";
pub const DEFAULT_TRAINING_IMAGE: &str =
    "europe-docker.pkg.dev/cloud-aiplatform/training/scikit-learn-cpu.0-23:latest";
pub const DEFAULT_SERVING_IMAGE: &str =
    "europe-docker.pkg.dev/cloud-aiplatform/prediction/sklearn-cpu.0-23:latest";

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration stored in `edge.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeConfig {
    pub google_cloud_project: GcpProjectConfig,
    pub storage_bucket: StorageBucketConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experiments: Option<ExperimentsConfig>,
    #[serde(default)]
    pub models: BTreeMap<String, ModelConfig>,
}

/// Google Cloud project identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GcpProjectConfig {
    pub project_id: String,
    pub region: String,
}

/// Storage bucket holding the DVC remote, Vertex AI job artifacts and the state document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageBucketConfig {
    pub bucket_name: String,
    #[serde(default = "default_dvc_store_directory")]
    pub dvc_store_directory: String,
    #[serde(default = "default_vertex_jobs_directory")]
    pub vertex_jobs_directory: String,
}

/// Experiment tracker (Sacred + Omniboard on GKE).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentsConfig {
    pub gke_cluster_name: String,
    pub mongodb_connection_string_secret: String,
}

/// One model served from a Vertex AI endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub name: String,
    pub endpoint_name: String,
    #[serde(default = "default_training_image")]
    pub training_container_image_uri: String,
    #[serde(default = "default_serving_image")]
    pub serving_container_image_uri: String,
}

fn default_dvc_store_directory() -> String {
    DEFAULT_DVC_STORE_DIRECTORY.to_string()
}

fn default_vertex_jobs_directory() -> String {
    DEFAULT_VERTEX_JOBS_DIRECTORY.to_string()
}

fn default_training_image() -> String {
    DEFAULT_TRAINING_IMAGE.to_string()
}

fn default_serving_image() -> String {
    DEFAULT_SERVING_IMAGE.to_string()
}

impl StorageBucketConfig {
    /// Bucket settings with the default directory layout.
    pub fn new(bucket_name: impl Into<String>) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            dvc_store_directory: default_dvc_store_directory(),
            vertex_jobs_directory: default_vertex_jobs_directory(),
        }
    }
}

impl ExperimentsConfig {
    pub fn new(gke_cluster_name: impl Into<String>) -> Self {
        Self {
            gke_cluster_name: gke_cluster_name.into(),
            mongodb_connection_string_secret: DEFAULT_MONGODB_SECRET.to_string(),
        }
    }
}

impl ModelConfig {
    /// Model settings derived from its name: endpoint `<name>-endpoint` and default images.
    pub fn for_name(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            endpoint_name: format!("{name}-endpoint"),
            name,
            training_container_image_uri: default_training_image(),
            serving_container_image_uri: default_serving_image(),
        }
    }
}

impl EdgeConfig {
    /// A fresh configuration with no experiments and no models.
    pub fn new(project: GcpProjectConfig, storage: StorageBucketConfig) -> Self {
        Self {
            google_cloud_project: project,
            storage_bucket: storage,
            experiments: None,
            models: BTreeMap::new(),
        }
    }

    /// Look up a model, failing with an actionable message when it is not configured.
    ///
    /// # Errors
    ///
    /// Returns a fatal `DomainError` if `name` is not in `models`.
    pub fn model(&self, name: &str) -> Result<&ModelConfig> {
        self.models.get(name).ok_or_else(|| {
            DomainError::new(format!(
                "Model '{name}' is not initialised. Initialise it by running `edge model init {name}`."
            ))
            .into()
        })
    }

    /// Experiment tracker settings, failing when experiments were never initialised.
    ///
    /// # Errors
    ///
    /// Returns a fatal `DomainError` if `experiments` is unset.
    pub fn experiments(&self) -> Result<&ExperimentsConfig> {
        self.experiments.as_ref().ok_or_else(|| {
            DomainError::new(
                "Experiment tracking is not initialised. Run `edge experiments init` to initialise it.",
            )
            .into()
        })
    }
}

// ── Validators ───────────────────────────────────────────────────────────────

/// Validates a model or resource name: lowercase letters, digits and dashes,
/// starting with a letter, at most 63 characters.
///
/// # Errors
///
/// Returns a fatal `DomainError` describing the rule that was broken.
pub fn validate_resource_name(kind: &str, name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name.len() <= 63
        && name.starts_with(|c: char| c.is_ascii_lowercase())
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !name.ends_with('-');
    if valid {
        Ok(())
    } else {
        Err(DomainError::new(format!(
            "Invalid {kind} name '{name}': use lowercase letters, digits and dashes, \
             start with a letter and keep it under 64 characters."
        ))
        .into())
    }
}

/// Validates a loaded configuration document.
///
/// # Errors
///
/// Returns a fatal `DomainError` for the first invalid field.
pub fn validate_config(config: &EdgeConfig) -> Result<()> {
    let project = &config.google_cloud_project;
    if project.project_id.trim().is_empty() {
        return Err(DomainError::new("google_cloud_project.project_id must not be empty").into());
    }
    if !is_supported_region(&project.region) {
        return Err(DomainError::new(format!(
            "Region '{}' is not available on Vertex AI. Choose one of: {}",
            project.region,
            crate::domain::regions::SUPPORTED_REGIONS.join(", ")
        ))
        .into());
    }
    if config.storage_bucket.bucket_name.trim().is_empty() {
        return Err(DomainError::new("storage_bucket.bucket_name must not be empty").into());
    }
    for (key, model) in &config.models {
        validate_resource_name("model", key)?;
        if model.name != *key {
            return Err(DomainError::new(format!(
                "Model entry '{key}' has mismatched name '{}'",
                model.name
            ))
            .into());
        }
    }
    Ok(())
}

// ── Unit tests ───────────────────────────────────────────────────────────────
