//! Application services: use-case orchestration.
//!
//! Each service module implements a single use-case by composing domain logic
//! with port trait calls. Services import only from `crate::domain` and
//! `crate::application::ports`, never from `crate::infra`, `crate::commands`,
//! or `crate::output`.

pub mod dvc;
pub mod environment;
pub mod experiments;
pub mod models;
pub mod precommand;
pub mod reconcile;
pub mod state_store;
