//! Command-level framing: intro line, closing title and exit code.

use std::process::ExitCode;

use anyhow::Result;
use owo_colors::OwoColorize as _;

use crate::domain::error::{DomainError, find_domain_error};
use crate::output::OutputContext;
use crate::output::tui::is_reported;

/// Titles and bodies printed when a command concludes.
#[derive(Debug, Clone, Default)]
pub struct CommandMessages {
    pub success_title: String,
    pub success_message: Option<String>,
    pub failure_title: String,
    pub failure_message: Option<String>,
}

impl CommandMessages {
    #[must_use]
    pub fn new(success_title: &str, failure_title: &str) -> Self {
        Self {
            success_title: success_title.to_string(),
            failure_title: failure_title.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_success_message(mut self, message: impl Into<String>) -> Self {
        self.success_message = Some(message.into());
        self
    }

    #[must_use]
    pub fn with_failure_message(mut self, message: impl Into<String>) -> Self {
        self.failure_message = Some(message.into());
        self
    }
}

/// Wraps one CLI command from intro to exit code.
///
/// `messages` stays mutable until [`CommandTui::conclude`], so a command can
/// tailor its closing text to what it found.
pub struct CommandTui<'a> {
    out: &'a OutputContext,
    pub messages: CommandMessages,
    silent: bool,
}

impl<'a> CommandTui<'a> {
    /// Print the intro and start the command.
    #[must_use]
    pub fn begin(out: &'a OutputContext, intro: &str, messages: CommandMessages) -> Self {
        out.line(&intro.style(out.styles.header).to_string());
        Self {
            out,
            messages,
            silent: false,
        }
    }

    /// A command that prints a single value: no intro, no titles.
    #[must_use]
    pub fn silent(out: &'a OutputContext) -> Self {
        Self {
            out,
            messages: CommandMessages::default(),
            silent: true,
        }
    }

    /// Turn the command's outcome into an exit code.
    ///
    /// # Errors
    ///
    /// Returns unexpected (non-domain) errors unchanged.
    pub fn conclude<T>(self, outcome: Result<T>) -> Result<ExitCode> {
        let err = match outcome {
            Ok(_) => {
                self.render_success();
                return Ok(ExitCode::SUCCESS);
            }
            Err(err) => err,
        };

        let reported = is_reported(&err);
        match find_domain_error(&err) {
            Some(DomainError::Warning(message)) => {
                if self.silent {
                    tracing::debug!(%message, "warning suppressed in silent command");
                } else {
                    self.out.warn(message);
                }
                self.render_success();
                Ok(ExitCode::SUCCESS)
            }
            Some(DomainError::Fatal(message)) => {
                tracing::debug!(reported, "command failed");
                if self.silent {
                    self.out.error(message);
                    return Ok(ExitCode::FAILURE);
                }
                if !reported || self.out.quiet {
                    self.out.error(message);
                }
                self.render_failure();
                Ok(ExitCode::FAILURE)
            }
            None => Err(err),
        }
    }

    fn render_success(&self) {
        if self.silent {
            return;
        }
        let styles = &self.out.styles;
        self.out.line("");
        self.out.line(&format!(
            "✅ {}",
            self.messages.success_title.style(styles.success)
        ));
        if let Some(body) = &self.messages.success_message {
            for line in body.lines() {
                self.out.line(line);
            }
        }
    }

    fn render_failure(&self) {
        let styles = &self.out.styles;
        self.out.line("");
        self.out.line(&format!(
            "❌ {}",
            self.messages.failure_title.style(styles.error)
        ));
        if let Some(body) = &self.messages.failure_message {
            for line in body.lines() {
                self.out.line(line);
            }
        }
    }
}
