//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use thiserror::Error;

// ── Domain errors ─────────────────────────────────────────────────────────────

/// The anticipated-failure signal.
///
/// `Fatal` aborts the command with exit code 1. `Warning` is recorded on the
/// nearest SubStep and execution continues. Together with `Ok` this is the
/// tagged outcome every fallible step resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("{0}")]
    Fatal(String),

    #[error("{0}")]
    Warning(String),
}

impl DomainError {
    /// A fatal error. Errors are fatal unless stated otherwise.
    pub fn new(message: impl Into<String>) -> Self {
        Self::Fatal(message.into())
    }

    /// A non-fatal error that becomes a warning on the enclosing SubStep.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::Warning(message.into())
    }

    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }

    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Fatal(m) | Self::Warning(m) => m,
        }
    }
}

/// Shorthand for `Err(DomainError::new(..).into())`.
///
/// # Errors
///
/// Always returns the fatal error.
pub fn fatal<T>(message: impl Into<String>) -> anyhow::Result<T> {
    Err(DomainError::new(message).into())
}

/// Find a `DomainError` anywhere in the error's chain.
#[must_use]
pub fn find_domain_error(err: &anyhow::Error) -> Option<&DomainError> {
    err.chain().find_map(|cause| cause.downcast_ref::<DomainError>())
}

// ── Provider errors ───────────────────────────────────────────────────────────

/// Failures reported by a cloud provider adapter.
///
/// The reconciler turns these into fatal `DomainError`s with an actionable
/// message; they are never shown to the operator verbatim.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("permission denied: {detail}")]
    PermissionDenied {
        permission: Option<String>,
        detail: String,
    },

    #[error("`{command}` failed: {detail}")]
    CommandFailed { command: String, detail: String },
}
