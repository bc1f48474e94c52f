//! Backend process supervision and readiness detection.
//!
//! The generator announces readiness by printing a sentinel line on its
//! diagnostic stream ("Analysis complete" for godoc). The supervisor spawns
//! the process with its side-specific bind address, then reads that stream
//! line by line until the marker appears or the stream ends. The wait is
//! bounded by the configured startup timeout; on any failure path the
//! spawned child is killed before the error is returned, so a failed
//! rebuild never leaks a half-started backend.

use crate::{Config, Error, Result, Side};
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

/// A generator process that has announced readiness.
///
/// Holds the child handle so the orchestrator can terminate the backend
/// once its side is no longer live.
#[derive(Debug)]
pub struct Backend {
    side: Side,
    endpoint: String,
    child: Child,
}

impl Backend {
    /// Side this backend serves.
    pub const fn side(&self) -> Side {
        self.side
    }

    /// Endpoint the backend is bound to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Kills the backend process. Used when its side stops being live.
    pub async fn terminate(mut self) {
        if let Err(e) = self.child.kill().await {
            warn!(side = %self.side, error = %e, "failed to kill outgoing backend");
        } else {
            debug!(side = %self.side, "outgoing backend terminated");
        }
    }
}

/// Starts generator backends and waits for their readiness marker.
pub struct BackendSupervisor {
    config: Arc<Config>,
}

impl BackendSupervisor {
    /// Creates a supervisor over the given config.
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// Spawns the generator for `side` and blocks until it announces
    /// readiness.
    ///
    /// Fails if the diagnostic stream closes before the marker appears or
    /// the startup timeout elapses; either way the child is killed first.
    pub async fn start(&self, side: Side) -> Result<Backend> {
        let endpoint = self.config.side_endpoint(side).to_string();
        let generator = &self.config.generator;
        info!(side = %side, endpoint = %endpoint, program = %generator.program, "starting backend");

        let mut child = Command::new(&generator.program)
            .arg(format!("--http={endpoint}"))
            .args(&generator.args)
            .env(
                &generator.workspace_env,
                self.config.side_root(side).as_os_str(),
            )
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stderr = child.stderr.take().ok_or_else(|| Error::BackendExited {
            side,
            detail: "diagnostic stream unavailable".to_string(),
        })?;

        let wait = Self::await_marker(BufReader::new(stderr), &generator.readiness_marker, side);
        match tokio::time::timeout(self.config.startup_timeout(), wait).await {
            Ok(Ok(())) => {
                info!(side = %side, endpoint = %endpoint, "backend ready");
                Ok(Backend {
                    side,
                    endpoint,
                    child,
                })
            },
            Ok(Err(e)) => {
                let _ = child.kill().await;
                Err(e)
            },
            Err(_) => {
                let _ = child.kill().await;
                Err(Error::ReadinessTimeout {
                    side,
                    waited_secs: self.config.generator.startup_timeout_secs,
                })
            },
        }
    }

    async fn await_marker(
        reader: BufReader<tokio::process::ChildStderr>,
        marker: &str,
        side: Side,
    ) -> Result<()> {
        let mut lines = reader.lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    debug!(side = %side, line = %line, "backend progress");
                    if line.contains(marker) {
                        return Ok(());
                    }
                },
                Ok(None) => {
                    return Err(Error::BackendExited {
                        side,
                        detail: "diagnostic stream closed before readiness marker".to_string(),
                    });
                },
                Err(e) => {
                    return Err(Error::BackendExited {
                        side,
                        detail: format!("error reading diagnostic stream: {e}"),
                    });
                },
            }
        }
    }
}
