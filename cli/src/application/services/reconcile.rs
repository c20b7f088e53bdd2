//! Application service: the idempotent "ensure resource exists" use-case.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! The same procedure runs for every resource kind; the kind-specific lookup
//! and creation calls come from the injected `ResourceProvider`.

use anyhow::Result;

use crate::application::ports::{ProgressReporter, ResourceProvider};
use crate::domain::error::{DomainError, ProviderError, find_domain_error};
use crate::domain::Status;

/// Result of an `ensure` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciled<D> {
    /// The resource already existed and was left untouched.
    Existing(D),
    /// The resource was missing and has been created.
    Created(D),
}

impl<D> Reconciled<D> {
    #[must_use]
    pub fn descriptor(&self) -> &D {
        match self {
            Self::Existing(d) | Self::Created(d) => d,
        }
    }

    #[must_use]
    pub fn into_descriptor(self) -> D {
        match self {
            Self::Existing(d) | Self::Created(d) => d,
        }
    }

    #[must_use]
    pub fn was_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Ensure the resource called `name` exists, creating it in `location` if not.
///
/// An existing resource is returned unchanged. When the lookup is ambiguous the
/// first candidate wins and the reporter is switched to `Warning` with an
/// explanation.
///
/// # Errors
///
/// Creation failures reported as `ProviderError` become fatal `DomainError`s
/// with an actionable message. Lookup failures and unexpected errors propagate
/// unchanged.
pub async fn ensure<P: ResourceProvider>(
    provider: &P,
    reporter: &mut impl ProgressReporter,
    name: &str,
    location: &str,
) -> Result<Reconciled<P::Descriptor>> {
    let kind = provider.kind();
    reporter.update(Some(&format!("Checking if {kind} '{name}' exists")), None);

    let mut candidates = provider.find(name).await?;
    tracing::debug!(%kind, name, found = candidates.len(), "reconcile lookup");

    if candidates.len() > 1 {
        reporter.update(None, Some(Status::Warning));
        reporter.add_explanation(&format!(
            "Multiple {kind}s named '{name}' were found. edge will use the first one found."
        ));
    }
    if !candidates.is_empty() {
        reporter.update(Some(&format!("Using existing {kind} '{name}'")), None);
        return Ok(Reconciled::Existing(candidates.swap_remove(0)));
    }

    reporter.update(
        Some(&format!("{kind} '{name}' does not exist, creating...")),
        None,
    );
    let created = provider
        .create(name, location)
        .await
        .map_err(|e| translate_create_error(e, &kind.to_string(), name, location))?;
    tracing::debug!(%kind, name, location, "reconcile created resource");
    reporter.update(Some(&format!("Created {kind} '{name}'")), None);
    Ok(Reconciled::Created(created))
}

/// Turn a provider failure during creation into an operator-facing error.
fn translate_create_error(err: anyhow::Error, kind: &str, name: &str, location: &str) -> anyhow::Error {
    if find_domain_error(&err).is_some() {
        return err;
    }
    match err.downcast::<ProviderError>() {
        Ok(ProviderError::PermissionDenied { permission, .. }) => {
            let hint = permission.map_or_else(
                || "Make sure your account has the role required to create it.".to_string(),
                |p| format!("Make sure you have '{p}' permission."),
            );
            DomainError::new(format!(
                "{} '{name}' could not be created in '{location}' because you have insufficient \
                 permission. {hint}",
                capitalise(kind)
            ))
            .into()
        }
        Ok(ProviderError::CommandFailed { detail, .. }) => DomainError::new(format!(
            "{} '{name}' could not be created in '{location}': {detail}",
            capitalise(kind)
        ))
        .into(),
        Err(other) => other,
    }
}

fn capitalise(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().collect::<String>() + chars.as_str()
    })
}
