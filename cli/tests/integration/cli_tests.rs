//! Integration tests for the CLI surface: help, argument parsing, config.

#![allow(clippy::expect_used)]

use predicates::prelude::*;
use tempfile::TempDir;

use crate::helpers::{Project, edge};

// --- Help and argument parsing ---

#[test]
fn test_cli_no_args_shows_help() {
    edge()
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn test_cli_help_lists_commands() {
    edge()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("force-unlock"))
        .stdout(predicate::str::contains("model"))
        .stdout(predicate::str::contains("experiments"));
}

#[test]
fn test_cli_version_flag_shows_version() {
    edge()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("edge"));
}

#[test]
fn test_model_help_lists_subcommands() {
    edge()
        .args(["model", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("deploy"))
        .stdout(predicate::str::contains("get-endpoint"))
        .stdout(predicate::str::contains("describe"));
}

#[test]
fn test_unknown_command_is_rejected() {
    edge().arg("frobnicate").assert().code(2);
}

// --- Configuration ---

#[test]
fn test_missing_config_points_to_init() {
    let dir = TempDir::new().expect("tempdir");
    edge()
        .current_dir(dir.path())
        .args(["config", "get-region"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("edge init"));
}

#[test]
fn test_config_get_region_prints_region() {
    let project = Project::new();
    project
        .edge()
        .args(["config", "get-region"])
        .assert()
        .success()
        .stdout("europe-west4\n");
}

#[test]
fn test_config_flag_overrides_default_path() {
    let project = Project::new();
    let elsewhere = TempDir::new().expect("tempdir");
    edge()
        .current_dir(elsewhere.path())
        .arg("--config")
        .arg(project.config_path())
        .args(["config", "get-region"])
        .assert()
        .success()
        .stdout("europe-west4\n");
}

#[test]
fn test_invalid_region_in_config_is_rejected() {
    let project = Project::new();
    let config = std::fs::read_to_string(project.config_path())
        .expect("read config")
        .replace("europe-west4", "mars-north1");
    std::fs::write(project.config_path(), config).expect("write config");
    project
        .edge()
        .args(["config", "get-region"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("mars-north1"));
}

#[test]
fn test_model_list_prints_configured_models() {
    let project = Project::new();
    project
        .edge()
        .args(["model", "list"])
        .assert()
        .success()
        .stdout("Configured models:\n - fashion\n");
}
