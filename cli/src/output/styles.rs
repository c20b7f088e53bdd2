//! Output styles using owo-colors stylesheet pattern

use owo_colors::Style;

use crate::domain::Status;

/// Centralized stylesheet for CLI output colors.
#[derive(Default, Clone)]
pub struct Styles {
    /// Success messages (green)
    pub success: Style,
    /// Warning messages (yellow)
    pub warning: Style,
    /// Error messages (red)
    pub error: Style,
    /// Pending work (cyan)
    pub pending: Style,
    /// Dimmed/secondary text
    pub dim: Style,
    /// Bold text
    pub bold: Style,
    /// Headers/section titles
    pub header: Style,
}

impl Styles {
    /// Apply colors to the stylesheet.
    pub fn colorize(&mut self) {
        self.success = Style::new().green();
        self.warning = Style::new().yellow();
        self.error = Style::new().red();
        self.pending = Style::new().cyan();
        self.dim = Style::new().dimmed();
        self.bold = Style::new().bold();
        self.header = Style::new().bold().cyan();
    }

    /// Style of the glyph shown next to a SubStep in `status`.
    #[must_use]
    pub fn for_status(&self, status: Status) -> Style {
        match status {
            Status::Neutral => self.dim,
            Status::Pending => self.pending,
            Status::Successful => self.success,
            Status::Failed => self.error,
            Status::Warning => self.warning,
        }
    }
}
