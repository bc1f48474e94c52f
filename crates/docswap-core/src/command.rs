//! Narrow external-command execution interface.
//!
//! The change detector and build pipeline never shell out directly; they go
//! through [`CommandRunner`] so tests can substitute a scripted fake. The
//! production implementation is [`SystemRunner`], backed by
//! `tokio::process::Command`.

use crate::Result;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Captured output of one external command invocation.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// Whether the command exited with status zero.
    pub success: bool,
}

impl CommandOutput {
    /// True when both output streams are empty after trimming.
    pub fn is_silent(&self) -> bool {
        self.stdout.trim().is_empty() && self.stderr.trim().is_empty()
    }
}

/// Executes external commands on behalf of the detector and pipeline.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs `program` with `args` in `cwd`, with `envs` added to the
    /// inherited environment, and captures its output.
    ///
    /// A non-zero exit status is not an `Err`; it is reported through
    /// [`CommandOutput::success`] so callers can apply their own policy.
    /// `Err` means the command could not be run at all.
    async fn run(
        &self,
        program: &str,
        args: &[String],
        cwd: &Path,
        envs: &[(String, String)],
    ) -> Result<CommandOutput>;
}

/// [`CommandRunner`] that spawns real OS processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    /// Creates a new system runner.
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        cwd: &Path,
        envs: &[(String, String)],
    ) -> Result<CommandOutput> {
        debug!(program, ?args, cwd = %cwd.display(), "running command");
        let output = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .envs(envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .output()
            .await?;
        let result = CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            success: output.status.success(),
        };
        debug!(
            program,
            success = result.success,
            stdout_bytes = result.stdout.len(),
            stderr_bytes = result.stderr.len(),
            "command finished"
        );
        Ok(result)
    }
}
