//! Directory-backed implementation of the `ObjectStore` port.
//!
//! A bucket is a directory `<root>/<bucket>/` and keys are relative paths
//! inside it. Writes are atomic (temp file + rename) and `create_new` relies
//! on `O_EXCL`, so readers never see a partially written object and two
//! lockers cannot both win. Selected with `EDGE_LOCAL_STATE_DIR`.

use std::io::{ErrorKind, Write as _};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::application::ports::ObjectStore;

/// Local directory standing in for a storage bucket.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    bucket_dir: PathBuf,
}

impl LocalObjectStore {
    /// Bind to `<root>/<bucket>`. The directory is not created here: a
    /// missing directory is a missing bucket.
    #[must_use]
    pub fn new(root: &Path, bucket: &str) -> Self {
        Self {
            bucket_dir: root.join(bucket),
        }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.bucket_dir.join(key)
    }

    fn write_sync(path: &Path, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
        let mut temp_name = path.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);
        std::fs::write(&temp_path, bytes)
            .with_context(|| format!("writing temp file {}", temp_path.display()))?;
        std::fs::rename(&temp_path, path)
            .with_context(|| format!("finalizing {}", path.display()))
    }

    fn create_new_sync(path: &Path, bytes: &[u8]) -> Result<bool> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
        {
            Ok(mut file) => {
                file.write_all(bytes)
                    .with_context(|| format!("writing {}", path.display()))?;
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(e).with_context(|| format!("creating {}", path.display())),
        }
    }
}

impl ObjectStore for LocalObjectStore {
    fn location(&self) -> String {
        self.bucket_dir.display().to_string()
    }

    async fn location_exists(&self) -> Result<bool> {
        Ok(self.bucket_dir.is_dir())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.path(key).is_file())
    }

    async fn read(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.path(key);
        tracing::debug!(path = %path.display(), "reading object");
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("reading {}", path.display()))
    }

    async fn write(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "writing object");
        let bytes = bytes.to_vec();
        tokio::task::spawn_blocking(move || Self::write_sync(&path, &bytes))
            .await
            .context("object write task panicked")?
    }

    async fn create_new(&self, key: &str, bytes: &[u8]) -> Result<bool> {
        let path = self.path(key);
        tracing::debug!(path = %path.display(), "creating object if absent");
        let bytes = bytes.to_vec();
        tokio::task::spawn_blocking(move || Self::create_new_sync(&path, &bytes))
            .await
            .context("object create task panicked")?
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.path(key);
        tracing::debug!(path = %path.display(), "deleting object");
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("removing {}", path.display())),
        }
    }
}
