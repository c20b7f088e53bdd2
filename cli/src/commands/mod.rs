//! Command implementations

pub mod common;
pub mod config;
pub mod dvc;
pub mod experiments;
pub mod force_unlock;
pub mod init;
pub mod model;
