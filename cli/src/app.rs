//! Application context: unified state passed to every command handler.
//!
//! `AppContext` is built once from the top-level flags and handed to every
//! command as `&AppContext`. Adapters are constructed from it on demand, so a
//! command only pays for the cloud clients it actually uses.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;

use crate::application::services::experiments::POLL_INTERVAL;
use crate::domain::EdgeConfig;
use crate::domain::error::DomainError;
use crate::infra::StateBackend;
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::config::YamlConfigStore;
use crate::infra::providers::GcpProject;
use crate::output::OutputContext;

/// Output rendering flags.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
}

/// Behaviour flags.
pub struct BehaviourFlags {
    /// Skip interactive prompts (also set by `CI` / `EDGE_YES` env vars).
    pub yes: bool,
    /// Path to `edge.yaml`.
    pub config: PathBuf,
}

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    /// Output rendering options.
    pub output: OutputFlags,
    /// Behaviour options.
    pub behaviour: BehaviourFlags,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Process runner shared by every gcloud/kubectl/helm/dvc adapter.
    pub runner: TokioCommandRunner,
    /// `edge.yaml` on disk.
    pub config_store: YamlConfigStore,
    /// Directory that stands in for Cloud Storage (`EDGE_LOCAL_STATE_DIR`).
    pub local_state_dir: Option<PathBuf>,
    /// Delay between load-balancer polls.
    pub poll_interval: Duration,
    /// When `true`, skip interactive prompts and use defaults.
    ///
    /// Set when `--yes` / `-y` is passed, or when the `CI` or `EDGE_YES`
    /// environment variables are present.
    pub non_interactive: bool,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    #[must_use]
    pub fn new(flags: &AppFlags) -> Self {
        let ci_env = std::env::var("CI").is_ok() || std::env::var("EDGE_YES").is_ok();
        let local_state_dir = std::env::var_os(crate::infra::LOCAL_STATE_DIR_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        Self {
            output: OutputContext::new(flags.output.no_color, flags.output.quiet),
            runner: TokioCommandRunner::new(),
            config_store: YamlConfigStore::new(flags.behaviour.config.clone()),
            local_state_dir,
            poll_interval: POLL_INTERVAL,
            non_interactive: flags.behaviour.yes || ci_env,
        }
    }

    /// Object store holding the state document for `config`'s bucket.
    #[must_use]
    pub fn state_backend(&self, config: &EdgeConfig) -> StateBackend<&TokioCommandRunner> {
        StateBackend::select(
            &self.runner,
            &config.storage_bucket.bucket_name,
            self.local_state_dir.clone(),
        )
    }

    /// Project coordinates for the cloud adapters.
    #[must_use]
    pub fn project(config: &EdgeConfig) -> GcpProject {
        GcpProject::new(
            config.google_cloud_project.project_id.clone(),
            config.google_cloud_project.region.clone(),
        )
    }

    /// Ask the user for confirmation.
    ///
    /// When `non_interactive` is `true` (CI, `--yes` flag, or `EDGE_YES` env),
    /// returns `default` immediately without prompting.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal prompt fails (e.g. no TTY available).
    pub fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        if self.non_interactive {
            return Ok(default);
        }
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact()?;
        Ok(confirmed)
    }

    /// Ask the user for a non-empty value.
    ///
    /// When `non_interactive` is `true`, returns `default`; without a default
    /// that is a fatal domain error.
    ///
    /// # Errors
    ///
    /// Returns a fatal `DomainError` if no value can be obtained, or an error
    /// if the terminal prompt fails.
    pub fn input(&self, prompt: &str, default: Option<&str>) -> Result<String> {
        if self.non_interactive {
            return default.map(str::to_string).ok_or_else(|| {
                DomainError::new(format!(
                    "'{prompt}' needs an answer, but prompts are disabled (--yes / CI)."
                ))
                .into()
            });
        }
        let mut input = dialoguer::Input::<String>::new()
            .with_prompt(prompt)
            .validate_with(|value: &String| {
                if value.trim().is_empty() {
                    Err("A value is required")
                } else {
                    Ok(())
                }
            });
        if let Some(default) = default {
            input = input.default(default.to_string());
        }
        Ok(input.interact_text()?.trim().to_string())
    }
}
