//! Shared helpers for shelling out to `gcloud`, `kubectl`, `helm` and `dvc`.

use std::process::Output;
use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;

use crate::application::ports::CommandRunner;
use crate::domain::error::{DomainError, ProviderError};

/// `Permission 'aiplatform.endpoints.create' denied on resource ...`
static PERMISSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"Permission '([A-Za-z0-9_.]+)' denied").expect("valid regex")
});

/// `... does not have storage.buckets.create access to ...`
static MISSING_ACCESS_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"does not have ([A-Za-z0-9_]+\.[A-Za-z0-9_.]+) access").expect("valid regex")
});

/// Classify a failed command's stderr.
#[must_use]
pub fn classify_failure(command: &str, stderr: &str) -> ProviderError {
    let detail = stderr.trim().to_string();
    let permission = PERMISSION_RE
        .captures(stderr)
        .or_else(|| MISSING_ACCESS_RE.captures(stderr))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());
    if permission.is_some()
        || stderr.contains("PERMISSION_DENIED")
        || stderr.contains("HTTPError 403")
    {
        return ProviderError::PermissionDenied { permission, detail };
    }
    ProviderError::CommandFailed {
        command: command.to_string(),
        detail,
    }
}

/// Render `program args..` for messages and logs.
#[must_use]
pub fn display_command(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Map a spawn failure of an external tool to a fatal domain error.
fn missing_tool(program: &str, err: anyhow::Error) -> anyhow::Error {
    tracing::debug!(program, error = %err, "spawn failed");
    DomainError::new(format!(
        "`{program}` could not be run. Make sure it is installed and on your PATH."
    ))
    .into()
}

/// Run a command and return its trimmed stdout, or a `ProviderError` on
/// non-zero exit.
///
/// # Errors
///
/// Fatal `DomainError` if the program is missing; `ProviderError` if it fails.
pub async fn run_checked(
    runner: &impl CommandRunner,
    program: &str,
    args: &[&str],
) -> Result<String> {
    let output = runner
        .run(program, args)
        .await
        .map_err(|e| missing_tool(program, e))?;
    into_stdout(program, args, &output)
}

/// Same as [`run_checked`], piping `stdin` to the process.
///
/// # Errors
///
/// Fatal `DomainError` if the program is missing; `ProviderError` if it fails.
pub async fn run_checked_with_stdin(
    runner: &impl CommandRunner,
    program: &str,
    args: &[&str],
    stdin: &[u8],
) -> Result<String> {
    let output = runner
        .run_with_stdin(program, args, stdin)
        .await
        .map_err(|e| missing_tool(program, e))?;
    into_stdout(program, args, &output)
}

/// Run a command and report only whether it exited successfully.
///
/// # Errors
///
/// Fatal `DomainError` if the program is missing.
pub async fn run_succeeds(
    runner: &impl CommandRunner,
    program: &str,
    args: &[&str],
) -> Result<bool> {
    let output = runner
        .run(program, args)
        .await
        .map_err(|e| missing_tool(program, e))?;
    Ok(output.status.success())
}

fn into_stdout(program: &str, args: &[&str], output: &Output) -> Result<String> {
    if output.status.success() {
        return Ok(String::from_utf8_lossy(&output.stdout).trim().to_string());
    }
    let command = display_command(program, args);
    let stderr = String::from_utf8_lossy(&output.stderr);
    tracing::debug!(%command, %stderr, "command failed");
    Err(classify_failure(&command, &stderr).into())
}
