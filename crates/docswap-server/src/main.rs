//! docswap daemon - blue-green proxy for generated documentation.
//!
//! Wires the pieces together: parses the CLI, loads configuration, starts
//! the HTTP proxy, and runs the orchestrator loop as a background task.
//! Serving starts immediately (requests get a 500 "docs are generating"
//! until the first backend is ready); a bootstrap failure aborts the whole
//! process since the service could never leave that state.

use anyhow::{Context, Result};
use clap::Parser;
use docswap_core::{Config, Orchestrator, RouterHandle, SystemRunner};
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod cli;
mod proxy;

use cli::Cli;
use proxy::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_logging(&cli)?;

    let mut config = match &cli.config {
        Some(path) => Config::from_path(path)?,
        None => Config::default(),
    };
    if let Some(listen) = &cli.listen {
        config.server.listen = listen.clone();
    }
    let config = Arc::new(config);

    let router = RouterHandle::new();
    let state = AppState::new(router.clone())?;

    let orchestrator = Orchestrator::new(
        Arc::clone(&config),
        Arc::new(SystemRunner::new()),
        router,
    );
    let orchestrator_task = tokio::spawn(orchestrator.run());

    tokio::select! {
        result = proxy::run_server(&config.server.listen, state) => result,
        result = orchestrator_task => match result {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(e).context("orchestrator failed"),
            Err(e) => Err(e).context("orchestrator task panicked"),
        },
    }
}

fn initialize_logging(cli: &Cli) -> Result<()> {
    let level = if cli.verbose || cli.debug {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
