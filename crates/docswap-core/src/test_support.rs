//! Shared fakes for unit tests.

use crate::command::{CommandOutput, CommandRunner};
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// One recorded [`CommandRunner::run`] invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

/// A [`CommandRunner`] that replays a queue of scripted responses and
/// records every invocation. When the queue runs dry it answers with a
/// silent success.
#[derive(Default)]
pub struct ScriptedRunner {
    responses: Mutex<VecDeque<Result<CommandOutput>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_ok(&self, stdout: &str, stderr: &str) {
        self.push(Ok(CommandOutput {
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            success: true,
        }));
    }

    pub fn push_exit_failure(&self) {
        self.push(Ok(CommandOutput {
            success: false,
            ..CommandOutput::default()
        }));
    }

    pub fn push_spawn_error(&self) {
        self.push(Err(Error::Io(std::io::Error::other("spawn failed"))));
    }

    pub fn push(&self, response: Result<CommandOutput>) {
        self.responses
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push_back(response);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        cwd: &Path,
        _envs: &[(String, String)],
    ) -> Result<CommandOutput> {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(RecordedCall {
                program: program.to_string(),
                args: args.to_vec(),
                cwd: cwd.to_path_buf(),
            });
        self.responses
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| {
                Ok(CommandOutput {
                    success: true,
                    ..CommandOutput::default()
                })
            })
    }
}

/// Writes an executable shell script into `dir` and returns its path.
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}
