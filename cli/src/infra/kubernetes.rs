//! MongoDB and Omniboard on GKE through `kubectl` and `helm`
//! (`ExperimentTracker` port).

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::application::ports::{CommandRunner, ExperimentTracker};
use crate::domain::error::ProviderError;
use crate::domain::ClusterDescriptor;
use crate::infra::exec::{run_checked, run_checked_with_stdin};

const NAMESPACE: &str = "default";
const MONGODB_RELEASE: &str = "mongodb";
const CONNECTION_SECRET: &str = "mongodb-connection";

/// Omniboard deployment and its LoadBalancer service. The internal MongoDB
/// connection string comes from the `mongodb-connection` secret.
const OMNIBOARD_MANIFEST: &str = r#"apiVersion: apps/v1
kind: Deployment
metadata:
  name: omniboard
  namespace: default
  labels:
    app: omniboard
spec:
  replicas: 1
  selector:
    matchLabels:
      app: omniboard
  template:
    metadata:
      labels:
        app: omniboard
    spec:
      containers:
        - name: omniboard
          image: vivekratnavel/omniboard:latest
          args: ["--mu", "$(MONGODB_CONNECTION)"]
          env:
            - name: MONGODB_CONNECTION
              valueFrom:
                secretKeyRef:
                  name: mongodb-connection
                  key: internal
          ports:
            - containerPort: 9000
---
apiVersion: v1
kind: Service
metadata:
  name: omniboard-lb
  namespace: default
spec:
  type: LoadBalancer
  selector:
    app: omniboard
  ports:
    - port: 9000
      targetPort: 9000
"#;

#[derive(Deserialize)]
struct HelmRelease {
    name: String,
}

/// `kubectl`/`helm` adapter. Credentials are fetched with gcloud.
pub struct KubernetesTracker<R: CommandRunner> {
    runner: R,
    project_id: String,
}

impl<R: CommandRunner> KubernetesTracker<R> {
    pub fn new(runner: R, project_id: impl Into<String>) -> Self {
        Self {
            runner,
            project_id: project_id.into(),
        }
    }
}

fn is_service_not_found(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<ProviderError>(),
        Some(ProviderError::CommandFailed { detail, .. }) if detail.contains("NotFound")
    )
}

impl<R: CommandRunner> ExperimentTracker for KubernetesTracker<R> {
    async fn get_credentials(&self, cluster: &ClusterDescriptor) -> Result<()> {
        run_checked(
            &self.runner,
            "gcloud",
            &[
                "container",
                "clusters",
                "get-credentials",
                &cluster.name,
                "--project",
                &self.project_id,
                "--region",
                &cluster.location,
            ],
        )
        .await
        .map(|_| ())
    }

    async fn is_mongodb_installed(&self) -> Result<bool> {
        let raw = run_checked(&self.runner, "helm", &["list", "-o", "json"]).await?;
        let releases: Vec<HelmRelease> =
            serde_json::from_str(&raw).context("cannot parse `helm list` output")?;
        Ok(releases.iter().any(|r| r.name == MONGODB_RELEASE))
    }

    async fn install_mongodb(&self) -> Result<()> {
        run_checked(
            &self.runner,
            "helm",
            &["repo", "add", "bitnami", "https://charts.bitnami.com/bitnami"],
        )
        .await?;
        run_checked(
            &self.runner,
            "helm",
            &[
                "upgrade",
                "-i",
                "--wait",
                MONGODB_RELEASE,
                "bitnami/mongodb",
                "--set",
                "auth.username=sacred,auth.database=sacred",
            ],
        )
        .await
        .map(|_| ())
    }

    async fn is_service_exposed(&self, service: &str) -> Result<bool> {
        match run_checked(
            &self.runner,
            "kubectl",
            &["get", "service", service, "--namespace", NAMESPACE, "-o", "name"],
        )
        .await
        {
            Ok(_) => Ok(true),
            Err(e) if is_service_not_found(&e) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn expose_mongodb(&self) -> Result<()> {
        run_checked(
            &self.runner,
            "kubectl",
            &[
                "expose",
                "deployment",
                MONGODB_RELEASE,
                "--name",
                "mongodb-lb",
                "--type",
                "LoadBalancer",
                "--port",
                "60000",
                "--target-port",
                "27017",
            ],
        )
        .await
        .map(|_| ())
    }

    async fn mongodb_password(&self) -> Result<String> {
        run_checked(
            &self.runner,
            "kubectl",
            &[
                "get",
                "secret",
                "--namespace",
                NAMESPACE,
                MONGODB_RELEASE,
                "-o",
                r#"go-template={{index .data "mongodb-password" | base64decode}}"#,
            ],
        )
        .await
    }

    async fn load_balancer_ip(&self, service: &str) -> Result<Option<String>> {
        let ip = run_checked(
            &self.runner,
            "kubectl",
            &[
                "get",
                "service",
                "--namespace",
                NAMESPACE,
                service,
                "-o",
                "jsonpath={.status.loadBalancer.ingress[0].ip}",
            ],
        )
        .await?;
        Ok(Some(ip).filter(|ip| !ip.is_empty()))
    }

    async fn store_connection_secret(&self, internal_connection_string: &str) -> Result<()> {
        run_checked(
            &self.runner,
            "kubectl",
            &[
                "delete",
                "secret",
                CONNECTION_SECRET,
                "--namespace",
                NAMESPACE,
                "--ignore-not-found",
            ],
        )
        .await?;
        let literal = format!("--from-literal=internal={internal_connection_string}");
        run_checked(
            &self.runner,
            "kubectl",
            &[
                "create",
                "secret",
                "generic",
                CONNECTION_SECRET,
                "--namespace",
                NAMESPACE,
                &literal,
            ],
        )
        .await
        .map(|_| ())
    }

    async fn install_omniboard(&self) -> Result<()> {
        run_checked_with_stdin(
            &self.runner,
            "kubectl",
            &["apply", "-f", "-"],
            OMNIBOARD_MANIFEST.as_bytes(),
        )
        .await
        .map(|_| ())
    }
}
