//! `dvc` CLI adapter (`DvcRepository` port).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::application::ports::{CommandRunner, DvcRepository};
use crate::infra::exec::run_checked;

/// The DVC repository rooted at the current working directory.
pub struct DvcCli<R: CommandRunner> {
    runner: R,
    root: PathBuf,
}

impl<R: CommandRunner> DvcCli<R> {
    pub fn new(runner: R, root: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            root: root.into(),
        }
    }

    fn dvc_dir(&self) -> PathBuf {
        self.root.join(".dvc")
    }
}

/// Parse `dvc remote list` output (`name<TAB>url` per line).
fn parse_remotes(raw: &str) -> Vec<(String, String)> {
    raw.lines()
        .filter_map(|line| {
            let (name, url) = line.split_once('\t')?;
            Some((name.trim().to_string(), url.trim().to_string()))
        })
        .collect()
}

fn remove_if_exists(path: &Path) -> Result<()> {
    if path.is_dir() {
        std::fs::remove_dir_all(path).with_context(|| format!("cannot delete {}", path.display()))
    } else if path.exists() {
        std::fs::remove_file(path).with_context(|| format!("cannot delete {}", path.display()))
    } else {
        Ok(())
    }
}

impl<R: CommandRunner> DvcRepository for DvcCli<R> {
    fn is_initialised(&self) -> bool {
        self.dvc_dir().is_dir()
    }

    async fn init(&self) -> Result<()> {
        run_checked(&self.runner, "dvc", &["init"]).await.map(|_| ())
    }

    async fn remote_url(&self, name: &str) -> Result<Option<String>> {
        let raw = run_checked(&self.runner, "dvc", &["remote", "list"]).await?;
        Ok(parse_remotes(&raw)
            .into_iter()
            .find(|(remote, _)| remote == name)
            .map(|(_, url)| url))
    }

    async fn add_remote(&self, name: &str, url: &str) -> Result<()> {
        run_checked(&self.runner, "dvc", &["remote", "add", "-d", name, url])
            .await
            .map(|_| ())
    }

    async fn modify_remote(&self, name: &str, url: &str) -> Result<()> {
        run_checked(&self.runner, "dvc", &["remote", "modify", name, "url", url]).await?;
        run_checked(&self.runner, "dvc", &["remote", "default", name])
            .await
            .map(|_| ())
    }

    fn destroy(&self) -> Result<()> {
        tracing::debug!(root = %self.root.display(), "destroying dvc repository");
        remove_if_exists(&self.dvc_dir())?;
        remove_if_exists(&self.root.join(".dvcignore"))
    }
}
