//! Outcome of a unit of work, as shown next to every progress line.

use std::fmt;

/// Resolved (or in-flight) state of a Step or SubStep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    /// Informational line; no success or failure implied.
    Neutral,
    /// Work in progress. Every SubStep starts here.
    #[default]
    Pending,
    /// Completed without error.
    Successful,
    /// Completed with a fatal error.
    Failed,
    /// Completed, but with a caveat the operator should read.
    Warning,
}

impl Status {
    /// Leading glyph used when rendering a line with this status.
    #[must_use]
    pub fn glyph(self) -> &'static str {
        match self {
            Self::Neutral => "•",
            Self::Pending => "…",
            Self::Successful => "✓",
            Self::Failed => "✗",
            Self::Warning => "⚠",
        }
    }

    /// Severity rank used to aggregate SubStep statuses into a Step status.
    #[must_use]
    pub fn severity(self) -> u8 {
        match self {
            Self::Neutral | Self::Pending => 0,
            Self::Successful => 1,
            Self::Warning => 2,
            Self::Failed => 3,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Neutral => "neutral",
            Self::Pending => "pending",
            Self::Successful => "successful",
            Self::Failed => "failed",
            Self::Warning => "warning",
        };
        f.write_str(name)
    }
}
