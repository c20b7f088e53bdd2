//! Step / SubStep progress rendering.
//!
//! A `Step` is a heading that groups related units of work. A `SubStep` wraps
//! exactly one fallible unit of work and resolves its outcome into a `Status`
//! through `finish`. Domain errors are rendered where they happen; the
//! command orchestrator only renders what a SubStep has not.

use std::cell::Cell;

use anyhow::{Result, anyhow};
use owo_colors::OwoColorize as _;
use thiserror::Error;

use crate::application::ports::ProgressReporter;
use crate::domain::error::{DomainError, find_domain_error};
use crate::domain::Status;
use crate::output::OutputContext;

/// A fatal domain error whose explanation is already on screen.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct Reported(#[source] pub DomainError);

/// Returns `true` if a SubStep already rendered this error.
#[must_use]
pub fn is_reported(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| cause.is::<Reported>())
}

/// A heading grouping SubSteps.
pub struct Step<'a> {
    out: &'a OutputContext,
    silent: bool,
    worst: Cell<Status>,
}

impl<'a> Step<'a> {
    /// Render `emoji message` as a heading.
    #[must_use]
    pub fn new(out: &'a OutputContext, emoji: &str, message: &str) -> Self {
        out.line("");
        out.line(&format!("{emoji} {}", message.style(out.styles.bold)));
        Self {
            out,
            silent: false,
            worst: Cell::new(Status::Successful),
        }
    }

    /// A Step that renders nothing, neither itself nor its SubSteps.
    #[must_use]
    pub fn silent(out: &'a OutputContext) -> Self {
        Self {
            out,
            silent: true,
            worst: Cell::new(Status::Successful),
        }
    }

    /// Start a SubStep in `Pending`.
    #[must_use]
    pub fn sub_step(&self, message: &str) -> SubStep<'_> {
        SubStep::start(self, message, Status::Pending, self.silent)
    }

    /// Start a SubStep with an explicit initial status.
    #[must_use]
    pub fn sub_step_with(&self, message: &str, status: Status) -> SubStep<'_> {
        SubStep::start(self, message, status, self.silent)
    }

    /// Worst status of the SubSteps finished so far.
    #[must_use]
    pub fn status(&self) -> Status {
        self.worst.get()
    }

    fn record(&self, status: Status) {
        if status.severity() > self.worst.get().severity() {
            self.worst.set(status);
        }
    }
}

/// One unit of work inside a `Step`.
///
/// Must be resolved with [`SubStep::finish`]. A SubStep dropped unresolved
/// renders as `Failed`.
pub struct SubStep<'s> {
    step: &'s Step<'s>,
    message: String,
    status: Status,
    silent: bool,
    dirty: bool,
    finished: bool,
}

impl<'s> SubStep<'s> {
    fn start(step: &'s Step<'s>, message: &str, status: Status, silent: bool) -> Self {
        let sub = Self {
            step,
            message: message.to_string(),
            status,
            silent,
            dirty: false,
            finished: false,
        };
        if !sub.silent {
            sub.step.out.line(&sub.format_line());
        }
        sub
    }

    #[must_use]
    pub fn status(&self) -> Status {
        self.status
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Resolve the unit of work.
    ///
    /// - `Ok` resolves a `Pending` SubStep to `Successful`; any other status
    ///   set along the way is kept.
    /// - A fatal `DomainError` renders `Failed` with the message as an
    ///   explanation and is returned wrapped in [`Reported`].
    /// - A non-fatal `DomainError` renders `Warning` with the message and is
    ///   swallowed: `Ok(None)`.
    /// - Anything else renders `Failed` and is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns fatal domain errors and unexpected errors.
    pub fn finish<T>(mut self, result: Result<T>) -> Result<Option<T>> {
        self.finished = true;
        let err = match result {
            Ok(value) => {
                if self.status == Status::Pending {
                    self.status = Status::Successful;
                }
                self.render();
                self.step.record(self.status);
                return Ok(Some(value));
            }
            Err(err) => err,
        };

        if is_reported(&err) {
            self.resolve(Status::Failed);
            return Err(err);
        }
        match find_domain_error(&err).cloned() {
            Some(DomainError::Warning(message)) => {
                self.resolve(Status::Warning);
                self.add_explanation(&message);
                Ok(None)
            }
            Some(fatal @ DomainError::Fatal(_)) => {
                self.resolve(Status::Failed);
                self.add_explanation(fatal.message());
                if self.is_visible() {
                    Err(Reported(fatal).into())
                } else {
                    Err(fatal.into())
                }
            }
            None => {
                tracing::debug!(error = %err, step = %self.message, "unexpected error");
                self.resolve(Status::Failed);
                Err(err)
            }
        }
    }

    /// Like [`SubStep::finish`], for work whose value is needed afterwards.
    ///
    /// A non-fatal domain error leaves nothing to continue with, so here it
    /// is treated as fatal.
    ///
    /// # Errors
    ///
    /// Returns every domain error and unexpected error.
    pub fn finish_value<T>(self, result: Result<T>) -> Result<T> {
        let result = result.map_err(|err| match find_domain_error(&err) {
            Some(DomainError::Warning(message)) => DomainError::new(message.clone()).into(),
            _ => err,
        });
        self.finish(result)?
            .ok_or_else(|| anyhow!("unit of work finished without a value"))
    }

    fn resolve(&mut self, status: Status) {
        self.status = status;
        self.render();
        self.step.record(status);
    }

    fn is_visible(&self) -> bool {
        !self.silent && !self.step.out.quiet
    }

    fn format_line(&self) -> String {
        let styles = &self.step.out.styles;
        format!(
            "  {} {}",
            self.status.glyph().style(styles.for_status(self.status)),
            self.message
        )
    }

    fn render(&self) {
        if self.silent {
            return;
        }
        let line = self.format_line();
        if self.dirty {
            self.step.out.line(&line);
        } else {
            self.step.out.replace_line(&line);
        }
    }
}

impl ProgressReporter for SubStep<'_> {
    fn update(&mut self, message: Option<&str>, status: Option<Status>) {
        if let Some(message) = message {
            self.message = message.to_string();
        }
        if let Some(status) = status {
            self.status = status;
        }
        self.render();
    }

    fn add_explanation(&mut self, text: &str) {
        self.dirty = true;
        if self.silent {
            return;
        }
        for line in text.lines() {
            self.step.out.line(&format!("      {line}"));
        }
    }

    fn set_dirty(&mut self) {
        self.dirty = true;
    }
}

impl Drop for SubStep<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.status = Status::Failed;
            self.render();
            self.step.record(Status::Failed);
        }
    }
}
