//! Resource kinds handled by the reconciler and their descriptors.

use std::fmt;

/// Kind of cloud resource an `ensure` call reconciles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    StorageBucket,
    Endpoint,
    Cluster,
    Secret,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::StorageBucket => "storage bucket",
            Self::Endpoint => "Vertex AI endpoint",
            Self::Cluster => "Kubernetes cluster",
            Self::Secret => "secret",
        })
    }
}

/// A GKE cluster found or created by the reconciler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterDescriptor {
    pub name: String,
    pub location: String,
}

/// Strip the `projects/<number>/` prefix from an endpoint resource name,
/// leaving `locations/<region>/endpoints/<id>` for console URLs.
#[must_use]
pub fn short_endpoint_name(resource_name: &str) -> String {
    resource_name
        .splitn(3, '/')
        .nth(2)
        .unwrap_or(resource_name)
        .to_string()
}

/// Cloud console link for a Vertex AI endpoint.
#[must_use]
pub fn endpoint_console_url(resource_name: &str, project_id: &str) -> String {
    format!(
        "https://console.cloud.google.com/vertex-ai/{}?project={project_id}",
        short_endpoint_name(resource_name)
    )
}
