//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: process execution, filesystem
//! access, and the gcloud/kubectl/helm/dvc adapters.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod command_runner;
pub mod config;
pub mod dvc;
pub mod exec;
pub mod gcloud;
pub mod gcs;
pub mod kubernetes;
pub mod local_store;
pub mod providers;
pub mod trained_model;
pub mod vertex;

use std::path::PathBuf;

use anyhow::Result;

use crate::application::ports::{CommandRunner, ObjectStore};
use crate::infra::gcs::GcsObjectStore;
use crate::infra::local_store::LocalObjectStore;

/// Environment variable selecting a local directory as the object store.
pub const LOCAL_STATE_DIR_ENV: &str = "EDGE_LOCAL_STATE_DIR";

/// Where the state document lives: Cloud Storage, or a local directory.
pub enum StateBackend<R: CommandRunner> {
    Gcs(GcsObjectStore<R>),
    Local(LocalObjectStore),
}

impl<R: CommandRunner> StateBackend<R> {
    /// Local directory when `local_dir` is set, Cloud Storage otherwise.
    pub fn select(runner: R, bucket: &str, local_dir: Option<PathBuf>) -> Self {
        match local_dir {
            Some(dir) => {
                tracing::debug!(dir = %dir.display(), bucket, "using local state backend");
                Self::Local(LocalObjectStore::new(&dir, bucket))
            }
            None => Self::Gcs(GcsObjectStore::new(runner, bucket)),
        }
    }

}

impl<R: CommandRunner> ObjectStore for StateBackend<R> {
    fn location(&self) -> String {
        match self {
            Self::Gcs(s) => s.location(),
            Self::Local(s) => s.location(),
        }
    }

    async fn location_exists(&self) -> Result<bool> {
        match self {
            Self::Gcs(s) => s.location_exists().await,
            Self::Local(s) => s.location_exists().await,
        }
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        match self {
            Self::Gcs(s) => s.exists(key).await,
            Self::Local(s) => s.exists(key).await,
        }
    }

    async fn read(&self, key: &str) -> Result<Vec<u8>> {
        match self {
            Self::Gcs(s) => s.read(key).await,
            Self::Local(s) => s.read(key).await,
        }
    }

    async fn write(&self, key: &str, bytes: &[u8]) -> Result<()> {
        match self {
            Self::Gcs(s) => s.write(key, bytes).await,
            Self::Local(s) => s.write(key, bytes).await,
        }
    }

    async fn create_new(&self, key: &str, bytes: &[u8]) -> Result<bool> {
        match self {
            Self::Gcs(s) => s.create_new(key, bytes).await,
            Self::Local(s) => s.create_new(key, bytes).await,
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        match self {
            Self::Gcs(s) => s.delete(key).await,
            Self::Local(s) => s.delete(key).await,
        }
    }
}
