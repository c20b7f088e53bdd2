//! Infrastructure implementation of the `ConfigStore` port.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::application::ports::ConfigStore;
use crate::domain::config::{EdgeConfig, validate_config};
use crate::domain::error::DomainError;

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "edge.yaml";

/// Production implementation of `ConfigStore` that uses a YAML file on disk.
pub struct YamlConfigStore {
    path: PathBuf,
}

impl YamlConfigStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigStore for YamlConfigStore {
    fn path(&self) -> &Path {
        &self.path
    }

    fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn load(&self) -> Result<EdgeConfig> {
        if !self.exists() {
            return Err(DomainError::new(format!(
                "Configuration file {} does not exist. Run `edge init` to create it.",
                self.path.display()
            ))
            .into());
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("cannot read {}", self.path.display()))?;
        let config: EdgeConfig = serde_yaml::from_str(&content).map_err(|e| {
            DomainError::new(format!(
                "Configuration file {} is not valid: {e}",
                self.path.display()
            ))
        })?;
        validate_config(&config)?;
        tracing::debug!(path = %self.path.display(), "configuration loaded");
        Ok(config)
    }

    fn save(&self, config: &EdgeConfig) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("cannot create {}", parent.display()))?;
        }
        let content = serde_yaml::to_string(config).context("cannot serialize config")?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("cannot write {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), "configuration saved");
        Ok(())
    }
}
