//! The state document: identifiers of everything provisioned for a project.
//!
//! Serialized as YAML and stored as a single object next to its lock marker.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;

/// Directory (inside the bucket) that holds state documents.
pub const STATE_PREFIX: &str = "edge-state";
/// Suffix appended to the state key to form the lock marker key.
pub const LOCK_SUFFIX: &str = ".lock";

/// Provisioned infrastructure for one project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeState {
    #[serde(default)]
    pub models: BTreeMap<String, ModelState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experiments: Option<ExperimentsState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageState>,
}

/// Serving endpoint of a model, and the model currently deployed to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelState {
    pub endpoint_resource_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployed_model_id: Option<String>,
}

/// Experiment tracker dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentsState {
    pub dashboard_url: String,
}

/// Canonical storage location, `gs://<bucket>/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageState {
    pub bucket_path: String,
}

impl EdgeState {
    /// Serialize the whole document.
    ///
    /// # Errors
    ///
    /// Returns an error if YAML serialization fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_yaml::to_string(self)
            .context("serializing state")?
            .into_bytes())
    }

    /// Parse a document previously produced by [`EdgeState::to_bytes`].
    ///
    /// # Errors
    ///
    /// Returns a fatal `DomainError` if the bytes are not a valid state document.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_yaml::from_slice(bytes).map_err(|e| {
            DomainError::new(format!(
                "The state file is corrupted and cannot be read ({e}). \
                 Fix or remove it in the storage bucket and run `edge init`."
            ))
            .into()
        })
    }

    /// State of a model, failing when the model was never initialised.
    ///
    /// # Errors
    ///
    /// Returns a fatal `DomainError` if `name` is not in `models`.
    pub fn model(&self, name: &str) -> Result<&ModelState> {
        self.models.get(name).ok_or_else(|| missing_model(name))
    }

    /// Mutable state of a model, with the same failure as [`EdgeState::model`].
    ///
    /// # Errors
    ///
    /// Returns a fatal `DomainError` if `name` is not in `models`.
    pub fn model_mut(&mut self, name: &str) -> Result<&mut ModelState> {
        self.models.get_mut(name).ok_or_else(|| missing_model(name))
    }

    /// Storage record, failing when storage was never provisioned.
    ///
    /// # Errors
    ///
    /// Returns a fatal `DomainError` if `storage` is unset.
    pub fn storage(&self) -> Result<&StorageState> {
        self.storage.as_ref().ok_or_else(|| {
            DomainError::new("Storage bucket is missing from the state. Run `edge init` first.").into()
        })
    }

    /// Experiment tracker record, failing when experiments were never initialised.
    ///
    /// # Errors
    ///
    /// Returns a fatal `DomainError` if `experiments` is unset.
    pub fn experiments(&self) -> Result<&ExperimentsState> {
        self.experiments.as_ref().ok_or_else(|| {
            DomainError::new(
                "Experiment tracking is missing from the state. Run `edge experiments init` first.",
            )
            .into()
        })
    }
}

fn missing_model(name: &str) -> anyhow::Error {
    DomainError::new(format!(
        "Model '{name}' is missing from the state. This might mean that the model has not \
         been initialised. Run `edge model init {name}` to initialise."
    ))
    .into()
}

/// Keys of the state document and its lock marker inside one bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateLocation {
    pub bucket: String,
    pub state_key: String,
    pub lock_key: String,
}

impl StateLocation {
    /// Location of the state for `project_id` in `bucket`.
    #[must_use]
    pub fn new(bucket: &str, project_id: &str) -> Self {
        let state_key = format!("{STATE_PREFIX}/{project_id}.yaml");
        Self {
            bucket: bucket.to_string(),
            lock_key: format!("{state_key}{LOCK_SUFFIX}"),
            state_key,
        }
    }
}

/// `gs://<bucket>/`, the canonical form stored in [`StorageState`].
#[must_use]
pub fn bucket_path(bucket: &str) -> String {
    format!("gs://{bucket}/")
}
