//! The build/serve control loop.
//!
//! A single sequential flow: bootstrap side A once, then poll forever. Only
//! the staging side is ever rebuilt, at most one rebuild is in flight, and
//! the router is swapped only after the new backend announces readiness.
//! A failed cycle is logged, recorded for the status endpoint, and then
//! forgotten; the live side keeps serving untouched.

use crate::command::CommandRunner;
use crate::detector::ChangeDetector;
use crate::pipeline::BuildPipeline;
use crate::router::RouterHandle;
use crate::supervisor::{Backend, BackendSupervisor};
use crate::{Config, Result, Side};
use std::sync::Arc;
use tracing::{info, warn};

/// Sequences change detection, rebuilds, readiness waits and swaps.
pub struct Orchestrator {
    config: Arc<Config>,
    detector: ChangeDetector,
    pipeline: BuildPipeline,
    supervisor: BackendSupervisor,
    router: RouterHandle,
    backends: [Option<Backend>; 2],
}

impl Orchestrator {
    /// Creates an orchestrator writing to `router`.
    pub fn new(config: Arc<Config>, runner: Arc<dyn CommandRunner>, router: RouterHandle) -> Self {
        Self {
            detector: ChangeDetector::new(Arc::clone(&config), Arc::clone(&runner)),
            pipeline: BuildPipeline::new(Arc::clone(&config), Arc::clone(&runner)),
            supervisor: BackendSupervisor::new(Arc::clone(&config)),
            config,
            router,
            backends: [None, None],
        }
    }

    /// Establishes the first live backend on side A, then seeds side B's
    /// workspace so the steady-state loop has checkouts to dry-run against.
    ///
    /// A failure on side A is fatal: without one ready side the service
    /// can never leave the "docs are generating" state, so startup aborts.
    /// A failed seed is only logged; the detector reads a missing checkout
    /// as "rebuild required", so the next tick retries it.
    pub async fn bootstrap(&mut self) -> Result<()> {
        info!(side = %Side::A, "bootstrapping first backend");
        self.router.set_staging(Some(Side::A));
        self.rebuild_and_swap(Side::A).await?;

        if let Err(e) = self.pipeline.refresh(Side::B).await {
            warn!(side = %Side::B, category = e.category(), error = %e, "staging workspace seed failed, retrying on next change");
        }
        Ok(())
    }

    /// Runs the bootstrap and then the steady-state polling loop. Never
    /// returns except with a bootstrap error.
    pub async fn run(mut self) -> Result<()> {
        self.bootstrap().await?;
        loop {
            tokio::time::sleep(self.config.poll_interval()).await;
            self.poll_cycle().await;
        }
    }

    /// One steady-state tick: detect, and only on change rebuild the
    /// staging side and swap. Cycle failures are absorbed here.
    pub async fn poll_cycle(&mut self) {
        let Some(active) = self.router.active() else {
            // Unreachable after a successful bootstrap.
            return;
        };
        let staging = active.side.other();

        if !self.detector.changes_pending(staging).await {
            return;
        }
        info!(side = %staging, "upstream change detected, rebuilding");
        self.router.set_staging(Some(staging));

        if let Err(e) = self.rebuild_and_swap(staging).await {
            warn!(side = %staging, category = e.category(), error = %e, "rebuild cycle failed, keeping current side live");
            self.router.record_error(e.to_string());
        }
    }

    /// Refresh → readiness wait → swap, then terminate the outgoing
    /// backend. Any error leaves the router untouched.
    async fn rebuild_and_swap(&mut self, side: Side) -> Result<()> {
        self.pipeline.refresh(side).await?;
        let backend = self.supervisor.start(side).await?;

        self.router.swap(side, backend.endpoint().to_string());
        info!(side = %side, endpoint = %backend.endpoint(), "swapped live side");

        let outgoing = self.backends[side.other().index()].take();
        self.backends[side.index()] = Some(backend);
        if let Some(outgoing) = outgoing {
            outgoing.terminate().await;
        }
        Ok(())
    }
}

#[cfg(all(test, unix))]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::config::Dependency;
    use crate::test_support::{write_script, ScriptedRunner};
    use std::path::Path;

    /// Generator that succeeds for every side: emits the marker, then
    /// lingers like a real backend would.
    const GENERATOR_OK: &str = "echo 'Analysis complete' >&2\nsleep 60";

    /// Generator that only ever becomes ready on side A's endpoint.
    const GENERATOR_A_ONLY: &str = r#"case "$1" in
  *8081*) echo 'Analysis complete' >&2; sleep 60;;
  *) echo 'crash during analysis' >&2; exit 1;;
esac"#;

    fn test_config(root: &Path, generator: &Path) -> Arc<Config> {
        let mut config = Config::default();
        config.workspace.root = root.to_path_buf();
        config.generator.program = generator.to_string_lossy().into_owned();
        config.generator.args = Vec::new();
        config.generator.startup_timeout_secs = 10;
        config.fetch.dependencies = vec![Dependency {
            name: "crypto".into(),
            url: "https://example.com/crypto".into(),
        }];
        Arc::new(config)
    }

    /// Lays down `.git` markers for every dependency on both sides, so the
    /// scripted runner stands in for repos that already have checkouts.
    fn seed_checkouts(config: &Config) {
        for side in [Side::A, Side::B] {
            for dep in &config.fetch.dependencies {
                std::fs::create_dir_all(config.dependency_dir(side, dep).join(".git")).unwrap();
            }
        }
    }

    fn orchestrator(
        root: &Path,
        generator_body: &str,
    ) -> (Orchestrator, Arc<ScriptedRunner>, RouterHandle) {
        let generator = write_script(root, "generator", generator_body);
        let runner = Arc::new(ScriptedRunner::new());
        let router = RouterHandle::new();
        let config = test_config(root, &generator);
        seed_checkouts(&config);
        let orchestrator = Orchestrator::new(config, runner.clone(), router.clone());
        (orchestrator, runner, router)
    }

    #[tokio::test]
    async fn bootstrap_promotes_side_a() {
        let dir = tempfile::tempdir().unwrap();
        let (mut orchestrator, _runner, router) = orchestrator(dir.path(), GENERATOR_OK);

        orchestrator.bootstrap().await.unwrap();

        let active = router.active().unwrap();
        assert_eq!(active.side, Side::A);
        assert_eq!(active.endpoint, "127.0.0.1:8081");
        assert_eq!(router.status_text(), "side=none\ncurrent=A\nerror=none\n");
    }

    #[tokio::test]
    async fn bootstrap_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let (mut orchestrator, runner, router) =
            orchestrator(dir.path(), "echo 'no marker here' >&2\nexit 1");
        runner.push_ok("", ""); // pipeline clone succeeds

        assert!(orchestrator.bootstrap().await.is_err());
        assert!(router.active().is_none());
    }

    #[tokio::test]
    async fn unchanged_tick_leaves_target_alone() {
        let dir = tempfile::tempdir().unwrap();
        let (mut orchestrator, runner, router) = orchestrator(dir.path(), GENERATOR_OK);
        orchestrator.bootstrap().await.unwrap();
        let before = router.active();

        // Two quiet ticks: dry-run fetches report nothing pending.
        orchestrator.poll_cycle().await;
        orchestrator.poll_cycle().await;

        assert_eq!(router.active(), before);
        // two bootstrap refreshes + two dry-runs, no rebuild commands
        assert_eq!(runner.calls().len(), 4);
    }

    #[tokio::test]
    async fn bootstrap_clones_both_workspaces() {
        let dir = tempfile::tempdir().unwrap();
        let generator = write_script(dir.path(), "generator", GENERATOR_OK);
        let runner = Arc::new(ScriptedRunner::new());
        let router = RouterHandle::new();
        let mut orchestrator =
            Orchestrator::new(test_config(dir.path(), &generator), runner.clone(), router.clone());

        orchestrator.bootstrap().await.unwrap();

        // Side A goes live; side B gets its first checkout too, so later
        // ticks have something to dry-run against.
        assert_eq!(router.active().unwrap().side, Side::A);
        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|c| c.args[0] == "clone"));
        assert!(calls[1].cwd.starts_with(dir.path().join("side-b")));
    }

    #[tokio::test]
    async fn failed_seed_recovers_on_next_tick() {
        let dir = tempfile::tempdir().unwrap();
        let generator = write_script(dir.path(), "generator", GENERATOR_OK);
        let runner = Arc::new(ScriptedRunner::new());
        let router = RouterHandle::new();
        let mut orchestrator =
            Orchestrator::new(test_config(dir.path(), &generator), runner.clone(), router.clone());

        runner.push_ok("", ""); // clone for A
        runner.push_exit_failure(); // clone for B fails
        orchestrator.bootstrap().await.unwrap();
        assert_eq!(router.active().unwrap().side, Side::A);

        // Side B still has no checkout, which itself reads as a pending
        // change; this tick retries the clone and promotes B.
        orchestrator.poll_cycle().await;
        assert_eq!(router.active().unwrap().side, Side::B);
    }

    #[tokio::test]
    async fn detected_change_rebuilds_staging_and_swaps() {
        let dir = tempfile::tempdir().unwrap();
        let (mut orchestrator, runner, router) = orchestrator(dir.path(), GENERATOR_OK);
        orchestrator.bootstrap().await.unwrap();

        runner.push_ok("", "   abc..def  main -> origin/main\n"); // dry-run: change on B
        orchestrator.poll_cycle().await;

        let active = router.active().unwrap();
        assert_eq!(active.side, Side::B);
        assert_eq!(active.endpoint, "127.0.0.1:8082");
        assert_eq!(router.status_text(), "side=none\ncurrent=B\nerror=none\n");
        // The rebuild cloned into side B's workspace, never side A's.
        let rebuild_call = runner.calls().into_iter().last().unwrap();
        assert!(rebuild_call.cwd.starts_with(dir.path().join("side-b")));
    }

    #[tokio::test]
    async fn failed_rebuild_keeps_previous_side_live() {
        let dir = tempfile::tempdir().unwrap();
        let (mut orchestrator, runner, router) = orchestrator(dir.path(), GENERATOR_A_ONLY);
        orchestrator.bootstrap().await.unwrap();
        let before = router.active().unwrap();

        runner.push_ok("changed", ""); // dry-run: change on B
        orchestrator.poll_cycle().await; // B's generator never emits the marker

        assert_eq!(router.active().unwrap(), before);
        let status = router.status_text();
        assert!(status.contains("current=A"));
        assert!(status.contains("error=backend for side B"));
    }

    #[tokio::test]
    async fn failed_pipeline_skips_readiness_wait() {
        let dir = tempfile::tempdir().unwrap();
        let (mut orchestrator, runner, router) = orchestrator(dir.path(), GENERATOR_OK);
        orchestrator.bootstrap().await.unwrap();
        let calls_after_bootstrap = runner.calls().len();

        runner.push_ok("changed", ""); // dry-run: change on B
        runner.push_exit_failure(); // clone for B fails
        orchestrator.poll_cycle().await;

        assert_eq!(router.active().unwrap().side, Side::A);
        assert!(router.last_error().is_some());
        // dry-run + failed clone only; no further pipeline steps
        assert_eq!(runner.calls().len(), calls_after_bootstrap + 2);
    }
}
