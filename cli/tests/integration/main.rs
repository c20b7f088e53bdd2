//! Integration tests for the edge CLI
//!
//! These tests spawn the actual binary and test end-to-end behavior.
//! Cloud Storage is replaced by a local directory via `EDGE_LOCAL_STATE_DIR`,
//! so only commands that do not call gcloud are exercised here.

mod cli_tests;
mod helpers;
mod state_commands;
