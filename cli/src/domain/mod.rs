//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod config;
pub mod error;
pub mod regions;
pub mod resource;
pub mod state;
pub mod status;
pub mod version;

pub use config::{EdgeConfig, ExperimentsConfig, GcpProjectConfig, ModelConfig, StorageBucketConfig};
pub use error::{DomainError, ProviderError};
pub use resource::{ClusterDescriptor, ResourceKind};
pub use state::{EdgeState, StateLocation};
pub use status::Status;
pub use version::Version;
