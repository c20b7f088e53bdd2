//! Tool version parsing and minimum-version comparison.

use std::fmt;

use anyhow::{Context, Result};

/// A `major.minor.patch` triple as reported by gcloud, kubectl or helm.
///
/// Accepts a leading `v` and ignores build metadata after `+`
/// (e.g. `v3.5.2+g167aac7`). Zero-padded components such as gcloud's
/// `2021.05.21` are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    #[must_use]
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse a version string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string does not contain three numeric components.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let core = trimmed.split('+').next().unwrap_or(trimmed);
        let core = core.strip_prefix('v').unwrap_or(core);
        let parts: Vec<&str> = core.split('.').collect();
        anyhow::ensure!(parts.len() == 3, "unrecognised version '{raw}'");
        let num = |s: &str| -> Result<u64> {
            s.parse::<u64>()
                .with_context(|| format!("unrecognised version '{raw}'"))
        };
        Ok(Self::new(num(parts[0])?, num(parts[1])?, num(parts[2])?))
    }

    #[must_use]
    pub fn is_at_least(self, other: Self) -> bool {
        self >= other
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
