//! Training output left in the working tree by the model pipeline.
//!
//! A finished training run writes `models/<name>/vertex_model.json`
//! containing the Vertex AI resource name of the uploaded model. A local
//! run writes `{"model_name": null, "is_local": true}` instead.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::domain::error::DomainError;

#[derive(Debug, Deserialize)]
struct TrainedModel {
    model_name: Option<String>,
    #[serde(default)]
    is_local: bool,
}

/// `<root>/models/<model>/vertex_model.json`.
#[must_use]
pub fn trained_model_path(root: &Path, model: &str) -> PathBuf {
    root.join("models").join(model).join("vertex_model.json")
}

/// Vertex AI resource name of the most recently trained `model`.
///
/// # Errors
///
/// Returns a fatal `DomainError` if the model has not been trained, was
/// trained locally, or the file is not valid.
pub fn read_trained_model(root: &Path, model: &str) -> Result<String> {
    let path = trained_model_path(root, model);
    if !path.is_file() {
        return Err(DomainError::new(format!(
            "{} does not exist. This means that the model has not been trained. \
             Train the model, or pass --model-resource-name explicitly.",
            path.display()
        ))
        .into());
    }
    let content =
        std::fs::read_to_string(&path).with_context(|| format!("cannot read {}", path.display()))?;
    let trained: TrainedModel = serde_json::from_str(&content).map_err(|e| {
        DomainError::new(format!("{} is not a valid training output: {e}", path.display()))
    })?;
    if trained.is_local {
        return Err(DomainError::new(
            "This model was trained locally, and hence cannot be deployed on Vertex AI",
        )
        .into());
    }
    let model_name = trained.model_name.ok_or_else(|| {
        DomainError::new(format!(
            "{} does not name a Vertex AI model. Train the model on Vertex AI, \
             or pass --model-resource-name explicitly.",
            path.display()
        ))
    })?;
    tracing::debug!(path = %path.display(), model = %model_name, "read trained model");
    Ok(model_name)
}
