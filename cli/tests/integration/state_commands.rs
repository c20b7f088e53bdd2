//! Integration tests for commands that read or unlock the state document.

#![allow(clippy::expect_used)]

use predicates::prelude::*;

use crate::helpers::{PROJECT, Project, exists};

fn lock_key() -> String {
    format!("edge-state/{PROJECT}.yaml.lock")
}

#[test]
fn test_get_endpoint_prints_resource_name() {
    let project = Project::with_state();
    project
        .edge()
        .args(["model", "get-endpoint", "fashion"])
        .assert()
        .success()
        .stdout("projects/123/locations/europe-west4/endpoints/456\n");
}

#[test]
fn test_get_endpoint_for_unknown_model_fails() {
    let project = Project::with_state();
    project
        .edge()
        .args(["model", "get-endpoint", "ghost"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("ghost"));
}

#[test]
fn test_get_endpoint_without_state_points_to_init() {
    let project = Project::new();
    project
        .edge()
        .args(["model", "get-endpoint", "fashion"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("edge init"));
}

#[test]
fn test_describe_renders_config_and_state() {
    let project = Project::with_state();
    project
        .edge()
        .args(["model", "describe", "fashion"])
        .assert()
        .success()
        .stdout(predicate::str::contains("endpoint_name: fashion-endpoint"))
        .stdout(predicate::str::contains(
            "endpoint_resource_name: projects/123/locations/europe-west4/endpoints/456",
        ));
}

#[test]
fn test_get_dashboard_prints_url() {
    let project = Project::with_state();
    project
        .edge()
        .args(["experiments", "get-dashboard"])
        .assert()
        .success()
        .stdout("http://34.1.2.3:9000\n");
}

#[test]
fn test_read_commands_ignore_a_held_lock() {
    let project = Project::with_state();
    project.write_bucket_object(&lock_key(), "");
    project
        .edge()
        .args(["experiments", "get-dashboard"])
        .assert()
        .success();
    assert!(exists(&project.bucket_object(&lock_key())));
}

#[test]
fn test_force_unlock_removes_lock_marker() {
    let project = Project::with_state();
    project.write_bucket_object(&lock_key(), "");
    project
        .edge()
        .arg("force-unlock")
        .assert()
        .success()
        .stdout(predicate::str::contains("State unlocked"));
    assert!(!exists(&project.bucket_object(&lock_key())));
}

#[test]
fn test_force_unlock_without_lock_succeeds() {
    let project = Project::with_state();
    project.edge().arg("force-unlock").assert().success();
}

#[test]
fn test_corrupted_state_is_reported() {
    let project = Project::new();
    project.write_bucket_object(&format!("edge-state/{PROJECT}.yaml"), "models: [broken");
    project
        .edge()
        .args(["experiments", "get-dashboard"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("corrupted"));
}
