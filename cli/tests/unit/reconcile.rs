//! Unit tests for the resource reconciler.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use edge_cli::application::services::reconcile::{Reconciled, ensure};
use edge_cli::domain::error::find_domain_error;
use edge_cli::domain::{ProviderError, Status};

use crate::mocks::{FakeProvider, RecordingReporter};

#[tokio::test]
async fn test_ensure_twice_creates_once() {
    let provider = FakeProvider::new();
    let mut reporter = RecordingReporter::default();

    let first = ensure(&provider, &mut reporter, "fashion-endpoint", "europe-west4")
        .await
        .unwrap();
    let second = ensure(&provider, &mut reporter, "fashion-endpoint", "europe-west4")
        .await
        .unwrap();

    assert!(first.was_created());
    assert!(!second.was_created());
    assert_eq!(first.descriptor(), second.descriptor());
    assert_eq!(provider.creates.get(), 1);
}

#[tokio::test]
async fn test_existing_resource_is_used_without_create() {
    let provider = FakeProvider::new().with("fashion-endpoint", "projects/1/endpoints/7");
    let mut reporter = RecordingReporter::default();

    let reconciled = ensure(&provider, &mut reporter, "fashion-endpoint", "europe-west4")
        .await
        .unwrap();

    assert_eq!(
        reconciled,
        Reconciled::Existing("projects/1/endpoints/7".to_string())
    );
    assert_eq!(provider.creates.get(), 0);
    assert!(reporter.statuses.is_empty());
}

#[tokio::test]
async fn test_ambiguous_name_picks_first_with_warning() {
    let provider = FakeProvider::new()
        .with("fashion-endpoint", "projects/1/endpoints/7")
        .with("fashion-endpoint", "projects/1/endpoints/8");
    let mut reporter = RecordingReporter::default();

    let reconciled = ensure(&provider, &mut reporter, "fashion-endpoint", "europe-west4")
        .await
        .unwrap();

    assert_eq!(reconciled.into_descriptor(), "projects/1/endpoints/7");
    assert_eq!(reporter.statuses, vec![Status::Warning]);
    assert!(reporter.explanations[0].contains("first one found"));
}

#[tokio::test]
async fn test_permission_failure_names_the_permission() {
    let provider = FakeProvider::new().failing_with(ProviderError::PermissionDenied {
        permission: Some("aiplatform.endpoints.create".to_string()),
        detail: "PERMISSION_DENIED".to_string(),
    });
    let mut reporter = RecordingReporter::default();

    let err = ensure(&provider, &mut reporter, "fashion-endpoint", "europe-west4")
        .await
        .unwrap_err();

    let domain = find_domain_error(&err).expect("translated to a domain error");
    assert!(domain.is_fatal());
    assert!(domain.message().contains("insufficient permission"));
    assert!(domain.message().contains("aiplatform.endpoints.create"));
    assert_eq!(provider.creates.get(), 0);
}

#[tokio::test]
async fn test_other_create_failure_is_fatal_with_detail() {
    let provider = FakeProvider::new().failing_with(ProviderError::CommandFailed {
        command: "gcloud ai endpoints create".to_string(),
        detail: "quota exceeded".to_string(),
    });
    let mut reporter = RecordingReporter::default();

    let err = ensure(&provider, &mut reporter, "fashion-endpoint", "europe-west4")
        .await
        .unwrap_err();

    let domain = find_domain_error(&err).expect("translated to a domain error");
    assert!(domain.message().contains("quota exceeded"));
}
