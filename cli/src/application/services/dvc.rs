//! Application service: DVC remote pointing at the project bucket.

use anyhow::Result;

use crate::application::ports::DvcRepository;

/// Name of the DVC remote managed by edge.
pub const REMOTE_NAME: &str = "storage";

/// How the existing repository relates to the desired remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DvcInspection {
    /// No `.dvc` directory yet.
    NotInitialised,
    /// Initialised, and the `storage` remote already points at the desired path.
    UpToDate,
    /// Initialised without a `storage` remote.
    MissingRemote,
    /// Initialised with a `storage` remote pointing elsewhere.
    Mismatch { current: String },
}

/// `<bucket_path><dvc_store_directory>`, e.g. `gs://bucket/dvcstore`.
#[must_use]
pub fn remote_path(bucket_path: &str, store_directory: &str) -> String {
    if bucket_path.ends_with('/') {
        format!("{bucket_path}{store_directory}")
    } else {
        format!("{bucket_path}/{store_directory}")
    }
}

/// Compare the repository in the working directory with `desired`.
///
/// # Errors
///
/// Returns an error if the remote list cannot be read.
pub async fn inspect(dvc: &impl DvcRepository, desired: &str) -> Result<DvcInspection> {
    if !dvc.is_initialised() {
        return Ok(DvcInspection::NotInitialised);
    }
    Ok(match dvc.remote_url(REMOTE_NAME).await? {
        Some(url) if url == desired => DvcInspection::UpToDate,
        Some(current) => DvcInspection::Mismatch { current },
        None => DvcInspection::MissingRemote,
    })
}

/// Initialise DVC if needed and point the default remote at `desired`.
///
/// # Errors
///
/// Returns the first failing dvc call.
pub async fn configure(dvc: &impl DvcRepository, desired: &str) -> Result<()> {
    if !dvc.is_initialised() {
        dvc.init().await?;
    }
    match dvc.remote_url(REMOTE_NAME).await? {
        Some(url) if url == desired => Ok(()),
        Some(_) => dvc.modify_remote(REMOTE_NAME, desired).await,
        None => dvc.add_remote(REMOTE_NAME, desired).await,
    }
}
