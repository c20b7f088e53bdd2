//! Line sinks for rendered output.
//!
//! Step/SubStep rendering rewrites the last line in place; the writer decides
//! how that happens on the actual terminal.

use std::sync::{Arc, Mutex, PoisonError};

use console::Term;

/// Where rendered lines go.
pub trait LineWriter {
    /// Append a line to stdout.
    fn write_line(&mut self, line: &str);
    /// Replace the most recently written stdout line.
    fn replace_last_line(&mut self, line: &str);
    /// Append a line to stderr.
    fn write_error_line(&mut self, line: &str);
}

/// Writes to the real terminal through `console::Term`.
///
/// When stdout is not a terminal, replacing a line degrades to appending.
pub struct TermWriter {
    stdout: Term,
    stderr: Term,
}

impl TermWriter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            stdout: Term::stdout(),
            stderr: Term::stderr(),
        }
    }
}

impl Default for TermWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl LineWriter for TermWriter {
    fn write_line(&mut self, line: &str) {
        if let Err(e) = self.stdout.write_line(line) {
            tracing::debug!(error = %e, "failed to write to stdout");
        }
    }

    fn replace_last_line(&mut self, line: &str) {
        if self.stdout.is_term() {
            if let Err(e) = self.stdout.clear_last_lines(1) {
                tracing::debug!(error = %e, "failed to clear line");
            }
        }
        self.write_line(line);
    }

    fn write_error_line(&mut self, line: &str) {
        if let Err(e) = self.stderr.write_line(line) {
            tracing::debug!(error = %e, "failed to write to stderr");
        }
    }
}

/// One line as seen by a `RecordingWriter`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
    Out(String),
    Err(String),
}

/// In-memory writer. Replacing a line edits the last recorded stdout line,
/// so the recording matches what a terminal would finally show.
#[derive(Clone, Default)]
pub struct RecordingWriter {
    lines: Arc<Mutex<Vec<Recorded>>>,
    replaced: Arc<Mutex<usize>>,
}

impl RecordingWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, in order.
    #[must_use]
    pub fn lines(&self) -> Vec<Recorded> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Stdout lines only.
    #[must_use]
    pub fn stdout(&self) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter_map(|l| match l {
                Recorded::Out(s) => Some(s),
                Recorded::Err(_) => None,
            })
            .collect()
    }

    /// Stderr lines only.
    #[must_use]
    pub fn stderr(&self) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter_map(|l| match l {
                Recorded::Err(s) => Some(s),
                Recorded::Out(_) => None,
            })
            .collect()
    }

    /// How many times a line was replaced in place.
    #[must_use]
    pub fn replacements(&self) -> usize {
        *self.replaced.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LineWriter for RecordingWriter {
    fn write_line(&mut self, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Recorded::Out(line.to_string()));
    }

    fn replace_last_line(&mut self, line: &str) {
        let mut lines = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
        match lines.iter().rposition(|l| matches!(l, Recorded::Out(_))) {
            Some(idx) => {
                lines[idx] = Recorded::Out(line.to_string());
                *self.replaced.lock().unwrap_or_else(PoisonError::into_inner) += 1;
            }
            None => lines.push(Recorded::Out(line.to_string())),
        }
    }

    fn write_error_line(&mut self, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Recorded::Err(line.to_string()));
    }
}
