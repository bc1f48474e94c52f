//! # docswap-core
//!
//! Core library for docswap - a blue-green orchestrator that keeps a
//! generated-documentation service continuously available while its content
//! is rebuilt from external sources.
//!
//! Two isolated environments ("sides") exist so a rebuild never disrupts
//! serving: one side is live, the other is refreshed in the background, and
//! control flips atomically once the new backend announces readiness. A
//! failed rebuild leaves the live side serving untouched.
//!
//! ## Architecture
//!
//! - **Side model**: a two-valued [`Side`] enum with a pure `other()`
//!   function; each side owns a workspace root and a distinct endpoint.
//! - **Change detection**: [`ChangeDetector`] runs non-mutating dry-run
//!   fetches against the staging side's checkouts; it fails closed.
//! - **Build pipeline**: [`BuildPipeline`] refreshes exactly one side's
//!   workspace; the first failing step aborts the cycle.
//! - **Backend supervision**: [`BackendSupervisor`] spawns the generator
//!   and waits (bounded) for its readiness marker on the diagnostic stream.
//! - **Routing state**: [`RouterHandle`] is the single mutex-guarded value
//!   shared with the request path; swaps are atomic.
//! - **Orchestration**: [`Orchestrator`] sequences the above in one
//!   strictly sequential background loop.
//!
//! The HTTP surface itself (proxying, `/_buildstatus`) lives in the
//! `docswap` binary crate; this crate owns all state and sequencing.

/// External-command execution interface and system implementation.
pub mod command;
/// TOML configuration with per-section defaults.
pub mod config;
/// Dry-run based upstream change detection.
pub mod detector;
/// Error types and result alias.
pub mod error;
/// The background build/serve control loop.
pub mod orchestrator;
/// Per-side workspace refresh.
pub mod pipeline;
/// Mutex-guarded routing state shared with the request path.
pub mod router;
/// The two-sided environment model.
pub mod side;
/// Generator process spawning and readiness detection.
pub mod supervisor;

#[cfg(test)]
#[allow(clippy::unwrap_used, missing_docs)]
pub(crate) mod test_support;

pub use command::{CommandOutput, CommandRunner, SystemRunner};
pub use config::{Config, Dependency, FetchConfig, GeneratorConfig, PollConfig, ServerConfig, WorkspaceConfig};
pub use detector::ChangeDetector;
pub use error::{Error, Result};
pub use orchestrator::Orchestrator;
pub use pipeline::BuildPipeline;
pub use router::{ActiveBackend, RouterHandle};
pub use side::Side;
pub use supervisor::{Backend, BackendSupervisor};
