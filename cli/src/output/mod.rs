//! Output formatting module
//!
//! Depends only on `crate::domain`. Everything the operator sees goes through
//! an `OutputContext` and its `LineWriter`.

pub mod orchestrator;
pub mod styles;
pub mod tui;
pub mod writer;

use std::cell::RefCell;

use console::Term;
use owo_colors::OwoColorize as _;
pub use orchestrator::{CommandMessages, CommandTui};
pub use styles::Styles;
pub use tui::{Reported, Step, SubStep};
pub use writer::{LineWriter, RecordingWriter, TermWriter};

/// Output context carrying styling and terminal state.
pub struct OutputContext {
    /// Stylesheet for colored output.
    pub styles: Styles,
    /// Whether to suppress non-error output.
    pub quiet: bool,
    writer: RefCell<Box<dyn LineWriter>>,
}

impl OutputContext {
    /// Create output context based on CLI flags and environment.
    #[must_use]
    pub fn new(no_color: bool, quiet: bool) -> Self {
        let use_colors = !no_color && Term::stdout().is_term() && std::env::var("NO_COLOR").is_err();

        let mut styles = Styles::default();
        if use_colors {
            styles.colorize();
        }

        Self {
            styles,
            quiet,
            writer: RefCell::new(Box::new(TermWriter::new())),
        }
    }

    /// Uncolored, non-quiet context writing into `writer`.
    #[must_use]
    pub fn with_writer(writer: impl LineWriter + 'static) -> Self {
        Self {
            styles: Styles::default(),
            quiet: false,
            writer: RefCell::new(Box::new(writer)),
        }
    }

    /// Append a raw line. Suppressed when `quiet`.
    pub fn line(&self, line: &str) {
        if !self.quiet {
            self.writer.borrow_mut().write_line(line);
        }
    }

    /// Replace the last raw line. Suppressed when `quiet`.
    pub fn replace_line(&self, line: &str) {
        if !self.quiet {
            self.writer.borrow_mut().replace_last_line(line);
        }
    }

    /// Print a value on its own line. Never suppressed: single-value
    /// commands exist to print it.
    pub fn value(&self, value: &str) {
        self.writer.borrow_mut().write_line(value);
    }

    /// Print a warning message prefixed with `⚠`. Suppressed when `quiet`.
    pub fn warn(&self, msg: &str) {
        self.line(&format!("  {} {msg}", "⚠".style(self.styles.warning)));
    }

    /// Print an error message prefixed with `✗` to stderr. Never suppressed.
    pub fn error(&self, msg: &str) {
        self.writer
            .borrow_mut()
            .write_error_line(&format!("  {} {msg}", "✗".style(self.styles.error)));
    }
}
