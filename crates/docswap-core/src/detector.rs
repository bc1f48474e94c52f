//! Change detection for the staging side's dependency checkouts.
//!
//! Asks the external source-control tool, per dependency, "would a fetch
//! change anything?" via a dry-run fetch. The check is non-mutating and
//! fails closed: any command failure downgrades this tick to "no change",
//! so a flaky network can delay a rebuild but never trigger a spurious one.

use crate::command::CommandRunner;
use crate::{Config, Side};
use std::sync::Arc;
use tracing::{debug, info};

/// Polls tracked dependencies for upstream changes.
pub struct ChangeDetector {
    config: Arc<Config>,
    runner: Arc<dyn CommandRunner>,
}

impl ChangeDetector {
    /// Creates a detector over the given config and command runner.
    pub fn new(config: Arc<Config>, runner: Arc<dyn CommandRunner>) -> Self {
        Self { config, runner }
    }

    /// Returns true when any tracked dependency in `side`'s workspace
    /// reports a pending upstream change.
    ///
    /// A dependency with no checkout on `side` counts as changed: there is
    /// nothing to dry-run against, and the rebuild that follows is what
    /// creates the checkout. Errors are absorbed: a failed or non-zero
    /// dry-run makes the whole attempt report `false` for this tick.
    pub async fn changes_pending(&self, side: Side) -> bool {
        let args = vec!["fetch".to_string(), "--dry-run".to_string()];
        for dep in &self.config.fetch.dependencies {
            let dir = self.config.dependency_dir(side, dep);
            if !dir.join(".git").exists() {
                info!(side = %side, dep = %dep.name, "checkout missing, rebuild required");
                return true;
            }
            let output = match self
                .runner
                .run(&self.config.fetch.program, &args, &dir, &[])
                .await
            {
                Ok(output) => output,
                Err(e) => {
                    debug!(side = %side, dep = %dep.name, error = %e, "dry-run fetch failed, treating as unchanged");
                    return false;
                },
            };
            if !output.success {
                debug!(side = %side, dep = %dep.name, "dry-run fetch exited non-zero, treating as unchanged");
                return false;
            }
            // git reports pending refs on stderr, so check both streams.
            if !output.is_silent() {
                debug!(side = %side, dep = %dep.name, "upstream change detected");
                return true;
            }
        }
        false
    }
}
