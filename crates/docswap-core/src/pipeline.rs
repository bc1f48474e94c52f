//! Dependency refresh for one side's workspace.
//!
//! The pipeline is the only component that writes to a workspace, and it
//! only ever writes to the side it was asked to refresh. Steps run in a
//! fixed order (optional toolchain refresh, then each dependency) and the
//! first failure aborts the whole refresh, so a half-updated workspace can
//! never be promoted: the caller only proceeds to readiness checks after an
//! `Ok`.

use crate::command::CommandRunner;
use crate::{Config, Error, Result, Side};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Refreshes a side's workspace from the external dependency sources.
pub struct BuildPipeline {
    config: Arc<Config>,
    runner: Arc<dyn CommandRunner>,
}

impl BuildPipeline {
    /// Creates a pipeline over the given config and command runner.
    pub fn new(config: Arc<Config>, runner: Arc<dyn CommandRunner>) -> Self {
        Self { config, runner }
    }

    /// Refreshes `side`'s workspace: toolchain step first (if configured),
    /// then a forced update of every tracked dependency.
    ///
    /// Dependencies without an existing checkout are cloned fresh; existing
    /// checkouts are force-pulled so local state never masks an upstream
    /// change.
    pub async fn refresh(&self, side: Side) -> Result<()> {
        let side_root = self.config.side_root(side);
        let deps_root = side_root.join("deps");
        std::fs::create_dir_all(&deps_root)?;

        if !self.config.fetch.toolchain_refresh_args.is_empty() {
            debug!(side = %side, "refreshing toolchain");
            let args = self.config.fetch.toolchain_refresh_args.clone();
            self.run_checked(&args, &side_root).await?;
        }

        for dep in &self.config.fetch.dependencies {
            let dir = self.config.dependency_dir(side, dep);
            if dir.join(".git").exists() {
                debug!(side = %side, dep = %dep.name, "updating checkout");
                self.run_checked(&["pull".into(), "--force".into()], &dir)
                    .await?;
            } else {
                debug!(side = %side, dep = %dep.name, "cloning fresh checkout");
                self.run_checked(
                    &[
                        "clone".into(),
                        dep.url.clone(),
                        dir.to_string_lossy().into_owned(),
                    ],
                    &deps_root,
                )
                .await?;
            }
        }

        info!(side = %side, root = %side_root.display(), "workspace refreshed");
        Ok(())
    }

    async fn run_checked(&self, args: &[String], cwd: &Path) -> Result<()> {
        let program = &self.config.fetch.program;
        let output = self.runner.run(program, args, cwd, &[]).await?;
        if output.success {
            Ok(())
        } else {
            Err(Error::CommandFailed {
                program: program.clone(),
                detail: format!(
                    "`{}` exited non-zero in {}: {}",
                    args.join(" "),
                    cwd.display(),
                    output.stderr.trim()
                ),
            })
        }
    }
}
