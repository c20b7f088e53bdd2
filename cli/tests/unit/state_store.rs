//! Unit tests for the state store: lock marker, load modes, scoped release.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use edge_cli::application::services::state_store::{AcquireOptions, LoadMode, StateStore};
use edge_cli::domain::error::{DomainError, find_domain_error};
use edge_cli::domain::state::{ModelState, StorageState, bucket_path};
use edge_cli::domain::{EdgeState, StateLocation};

use crate::mocks::InMemoryObjectStore;

fn location() -> StateLocation {
    StateLocation::new("bucket", "my-project")
}

fn fatal_message(err: &anyhow::Error) -> String {
    let domain = find_domain_error(err).expect("domain error");
    assert!(domain.is_fatal());
    domain.message().to_string()
}

fn sample_state() -> EdgeState {
    let mut state = EdgeState::default();
    state.models.insert(
        "fashion".to_string(),
        ModelState {
            endpoint_resource_name: "projects/1/locations/europe-west4/endpoints/9".to_string(),
            deployed_model_id: None,
        },
    );
    state.storage = Some(StorageState {
        bucket_path: bucket_path("bucket"),
    });
    state
}

#[tokio::test]
async fn test_lock_scenario() {
    let missing = InMemoryObjectStore::without_bucket();
    let store = StateStore::new(&missing, location());
    let err = store.lock().await.unwrap_err();
    assert!(fatal_message(&err).contains("does not exist"));

    let objects = InMemoryObjectStore::new();
    let store = StateStore::new(&objects, location());
    let _first = store.lock().await.unwrap();
    assert!(objects.contains("edge-state/my-project.yaml.lock"));

    let err = store.lock().await.unwrap_err();
    assert!(fatal_message(&err).contains("locked"));

    store.unlock().await.unwrap();
    assert!(!objects.contains("edge-state/my-project.yaml.lock"));
    let _second = store.lock().await.unwrap();
}

#[tokio::test]
async fn test_unlock_without_marker_is_ok() {
    let objects = InMemoryObjectStore::new();
    let store = StateStore::new(&objects, location());
    store.unlock().await.unwrap();
}

#[tokio::test]
async fn test_strict_load_of_absent_state_is_fatal() {
    let objects = InMemoryObjectStore::new();
    let store = StateStore::new(&objects, location());
    let err = store.load(LoadMode::Strict).await.unwrap_err();
    assert!(fatal_message(&err).contains("edge init"));
}

#[tokio::test]
async fn test_permissive_load_of_absent_state_is_empty() {
    let objects = InMemoryObjectStore::new();
    let store = StateStore::new(&objects, location());
    assert_eq!(
        store.load(LoadMode::Permissive).await.unwrap(),
        EdgeState::default()
    );
}

#[tokio::test]
async fn test_save_then_load_returns_equal_state() {
    let objects = InMemoryObjectStore::new();
    let store = StateStore::new(&objects, location());
    store.save(&sample_state()).await.unwrap();
    assert!(store.exists().await.unwrap());
    assert_eq!(store.load(LoadMode::Strict).await.unwrap(), sample_state());
}

#[tokio::test]
async fn test_corrupted_state_is_fatal() {
    let objects = InMemoryObjectStore::new();
    objects.put("edge-state/my-project.yaml", b"models: [broken");
    let store = StateStore::new(&objects, location());
    let err = store.load(LoadMode::Permissive).await.unwrap_err();
    assert!(fatal_message(&err).contains("corrupted"));
}

#[tokio::test]
async fn test_exclusive_lease_saves_and_unlocks_on_success() {
    let objects = InMemoryObjectStore::new();
    let store = StateStore::new(&objects, location());
    store.save(&EdgeState::default()).await.unwrap();

    let mut lease = store.acquire(AcquireOptions::exclusive()).await.unwrap();
    assert!(lease.is_locked());
    assert!(objects.contains("edge-state/my-project.yaml.lock"));
    lease.state = sample_state();
    lease.release(Ok(())).await.unwrap();

    assert!(!objects.contains("edge-state/my-project.yaml.lock"));
    assert_eq!(store.load(LoadMode::Strict).await.unwrap(), sample_state());
}

#[tokio::test]
async fn test_failed_scope_saves_and_unlocks() {
    let objects = InMemoryObjectStore::new();
    let store = StateStore::new(&objects, location());
    store.save(&EdgeState::default()).await.unwrap();

    let mut lease = store.acquire(AcquireOptions::exclusive()).await.unwrap();
    lease.state = sample_state();
    let outcome: anyhow::Result<()> = Err(DomainError::new("endpoint creation failed").into());
    let err = lease.release(outcome).await.unwrap_err();

    assert_eq!(fatal_message(&err), "endpoint creation failed");
    assert!(!objects.contains("edge-state/my-project.yaml.lock"));
    assert_eq!(store.load(LoadMode::Strict).await.unwrap(), sample_state());
}

#[tokio::test]
async fn test_failed_read_only_scope_writes_nothing() {
    let objects = InMemoryObjectStore::new();
    let store = StateStore::new(&objects, location());
    store.save(&sample_state()).await.unwrap();
    let writes_before = objects.writes.get();

    let mut lease = store.acquire(AcquireOptions::read_only()).await.unwrap();
    lease.state = EdgeState::default();
    let outcome: anyhow::Result<()> = Err(DomainError::new("lookup failed").into());
    lease.release(outcome).await.unwrap_err();

    assert_eq!(objects.writes.get(), writes_before);
}

#[tokio::test]
async fn test_acquire_releases_lock_when_load_fails() {
    let objects = InMemoryObjectStore::new();
    let store = StateStore::new(&objects, location());
    let err = store
        .acquire(AcquireOptions::exclusive())
        .await
        .err()
        .expect("absent state must fail a strict acquire");
    assert!(fatal_message(&err).contains("does not exist"));
    assert!(!objects.contains("edge-state/my-project.yaml.lock"));
}

#[tokio::test]
async fn test_load_error_survives_failed_unlock() {
    let objects = InMemoryObjectStore::new();
    objects.fail_delete.set(true);
    let store = StateStore::new(&objects, location());
    let err = store
        .acquire(AcquireOptions::exclusive())
        .await
        .err()
        .expect("absent state must fail a strict acquire");
    assert!(fatal_message(&err).contains("does not exist"));
    assert!(objects.contains("edge-state/my-project.yaml.lock"));
}

#[tokio::test]
async fn test_read_only_lease_never_writes() {
    let objects = InMemoryObjectStore::new();
    let store = StateStore::new(&objects, location());
    store.save(&sample_state()).await.unwrap();
    let writes_before = objects.writes.get();

    let mut lease = store.acquire(AcquireOptions::read_only()).await.unwrap();
    assert!(!lease.is_locked());
    lease.state.models.clear();
    lease.release(Ok(())).await.unwrap();

    assert_eq!(objects.writes.get(), writes_before);
    assert_eq!(store.load(LoadMode::Strict).await.unwrap(), sample_state());
}

#[tokio::test]
async fn test_held_lock_blocks_exclusive_acquire() {
    let objects = InMemoryObjectStore::new();
    let store = StateStore::new(&objects, location());
    store.save(&EdgeState::default()).await.unwrap();
    let _held = store.lock().await.unwrap();

    let err = store
        .acquire(AcquireOptions::exclusive())
        .await
        .err()
        .expect("second locker must fail");
    assert!(fatal_message(&err).contains("force-unlock"));
    assert!(objects.contains("edge-state/my-project.yaml.lock"));
}
