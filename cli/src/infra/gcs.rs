//! Cloud Storage implementation of the `ObjectStore` port via `gcloud storage`.

use anyhow::Result;

use crate::application::ports::{CommandRunner, ObjectStore};
use crate::domain::error::ProviderError;
use crate::infra::exec::{classify_failure, run_checked, run_checked_with_stdin, run_succeeds};

/// Objects inside one Cloud Storage bucket.
pub struct GcsObjectStore<R: CommandRunner> {
    runner: R,
    bucket: String,
}

impl<R: CommandRunner> GcsObjectStore<R> {
    pub fn new(runner: R, bucket: impl Into<String>) -> Self {
        Self {
            runner,
            bucket: bucket.into(),
        }
    }

    fn url(&self, key: &str) -> String {
        format!("gs://{}/{key}", self.bucket)
    }
}

/// `--if-generation-match=0` failures mean the object already exists.
fn is_precondition_failure(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<ProviderError>(),
        Some(ProviderError::CommandFailed { detail, .. })
            if detail.contains("412") || detail.contains("PreconditionFailed") || detail.contains("precondition")
    )
}

/// `gcloud storage rm` on an absent object; older gsutil wording included.
fn is_missing_object(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<ProviderError>(),
        Some(ProviderError::CommandFailed { detail, .. })
            if detail.contains("matched no objects")
                || detail.contains("No URLs matched")
                || detail.contains("404")
                || detail.contains("not found")
    )
}

impl<R: CommandRunner> ObjectStore for GcsObjectStore<R> {
    fn location(&self) -> String {
        format!("gs://{}", self.bucket)
    }

    async fn location_exists(&self) -> Result<bool> {
        run_succeeds(
            &self.runner,
            "gcloud",
            &["storage", "buckets", "describe", &self.location(), "--format=value(name)"],
        )
        .await
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        run_succeeds(
            &self.runner,
            "gcloud",
            &["storage", "objects", "describe", &self.url(key), "--format=value(name)"],
        )
        .await
    }

    async fn read(&self, key: &str) -> Result<Vec<u8>> {
        tracing::debug!(key, bucket = %self.bucket, "reading object");
        let output = self
            .runner
            .run("gcloud", &["storage", "cat", &self.url(key)])
            .await?;
        if output.status.success() {
            return Ok(output.stdout);
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(classify_failure("gcloud storage cat", &stderr).into())
    }

    async fn write(&self, key: &str, bytes: &[u8]) -> Result<()> {
        tracing::debug!(key, bucket = %self.bucket, bytes = bytes.len(), "writing object");
        run_checked_with_stdin(
            &self.runner,
            "gcloud",
            &["storage", "cp", "-", &self.url(key)],
            bytes,
        )
        .await
        .map(|_| ())
    }

    async fn create_new(&self, key: &str, bytes: &[u8]) -> Result<bool> {
        tracing::debug!(key, bucket = %self.bucket, "creating object if absent");
        match run_checked_with_stdin(
            &self.runner,
            "gcloud",
            &["storage", "cp", "--if-generation-match=0", "-", &self.url(key)],
            bytes,
        )
        .await
        {
            Ok(_) => Ok(true),
            Err(e) if is_precondition_failure(&e) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        tracing::debug!(key, bucket = %self.bucket, "deleting object");
        match run_checked(&self.runner, "gcloud", &["storage", "rm", &self.url(key)]).await {
            Ok(_) => Ok(()),
            Err(e) if is_missing_object(&e) => Ok(()),
            Err(e) => Err(e),
        }
    }
}
