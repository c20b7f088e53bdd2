//! Infrastructure implementation of the `CommandRunner` port.
//!
//! `TokioCommandRunner` is the production implementation that uses tokio
//! for async process execution. Provisioning calls (cluster creation, helm
//! installs) can take many minutes, so nothing here times out; the child is
//! killed if the future is dropped.

use std::process::{Output, Stdio};

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::application::ports::CommandRunner;

/// Production `CommandRunner`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioCommandRunner;

impl TokioCommandRunner {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    async fn collect(
        program: &str,
        mut child: tokio::process::Child,
        stdin: Option<Vec<u8>>,
    ) -> Result<Output> {
        let stdin_handle = child.stdin.take();
        let stdin_task = tokio::spawn(async move {
            if let (Some(mut handle), Some(input)) = (stdin_handle, stdin) {
                let _ = handle.write_all(&input).await;
            }
        });

        let mut stdout_handle = child.stdout.take();
        let mut stderr_handle = child.stderr.take();

        let (status, stdout, stderr) = tokio::join!(
            child.wait(),
            async {
                let mut buf = Vec::new();
                if let Some(ref mut h) = stdout_handle {
                    let _ = h.read_to_end(&mut buf).await;
                }
                buf
            },
            async {
                let mut buf = Vec::new();
                if let Some(ref mut h) = stderr_handle {
                    let _ = h.read_to_end(&mut buf).await;
                }
                buf
            },
        );
        let _ = stdin_task.await;
        let output = Output {
            status: status.with_context(|| format!("waiting for {program}"))?,
            stdout,
            stderr,
        };
        tracing::debug!(program, status = %output.status, "command finished");
        Ok(output)
    }
}

impl CommandRunner for TokioCommandRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        tracing::debug!(program, ?args, "running command");
        let child = tokio::process::Command::new(program)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn {program}"))?;
        Self::collect(program, child, None).await
    }

    async fn run_with_stdin(&self, program: &str, args: &[&str], input: &[u8]) -> Result<Output> {
        tracing::debug!(program, ?args, bytes = input.len(), "running command with stdin");
        let child = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn {program}"))?;
        Self::collect(program, child, Some(input.to_vec())).await
    }
}
