//! Fixtures shared by the integration tests.

#![allow(clippy::expect_used)]

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

pub const PROJECT: &str = "my-project";
pub const BUCKET: &str = "my-bucket";

pub const CONFIG: &str = "\
google_cloud_project:
  project_id: my-project
  region: europe-west4
storage_bucket:
  bucket_name: my-bucket
experiments:
  gke_cluster_name: sacred
  mongodb_connection_string_secret: sacred-mongodb-connection-string
models:
  fashion:
    name: fashion
    endpoint_name: fashion-endpoint
";

pub const STATE: &str = "\
models:
  fashion:
    endpoint_resource_name: projects/123/locations/europe-west4/endpoints/456
    deployed_model_id: '789'
experiments:
  dashboard_url: http://34.1.2.3:9000
storage:
  bucket_path: gs://my-bucket/
";

/// A project directory with `edge.yaml` and a local bucket holding the state.
pub struct Project {
    pub dir: TempDir,
}

impl Project {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        std::fs::write(dir.path().join("edge.yaml"), CONFIG).expect("write config");
        std::fs::create_dir_all(dir.path().join("buckets").join(BUCKET)).expect("create bucket");
        Self { dir }
    }

    /// Project whose bucket already holds a state document.
    pub fn with_state() -> Self {
        let project = Self::new();
        project.write_bucket_object(&format!("edge-state/{PROJECT}.yaml"), STATE);
        project
    }

    pub fn bucket_object(&self, key: &str) -> PathBuf {
        self.dir.path().join("buckets").join(BUCKET).join(key)
    }

    pub fn write_bucket_object(&self, key: &str, content: &str) {
        let path = self.bucket_object(key);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create object dir");
        }
        std::fs::write(path, content).expect("write object");
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join("edge.yaml")
    }

    /// `edge` bound to this project's config and local bucket.
    pub fn edge(&self) -> Command {
        let mut cmd = edge();
        cmd.env("EDGE_CONFIG", self.config_path())
            .env("EDGE_LOCAL_STATE_DIR", self.dir.path().join("buckets"))
            .current_dir(self.dir.path());
        cmd
    }
}

/// `edge` with colors off and prompts disabled.
pub fn edge() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("edge"));
    cmd.env("NO_COLOR", "1")
        .env("EDGE_YES", "1")
        .env_remove("EDGE_CONFIG")
        .env_remove("EDGE_LOCAL_STATE_DIR")
        .env_remove("EDGE_LOG");
    cmd
}

pub fn exists(path: &Path) -> bool {
    path.try_exists().unwrap_or(false)
}
