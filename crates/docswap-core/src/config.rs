//! Configuration for the docswap orchestrator.
//!
//! Configuration is a single TOML file with per-section defaults; any
//! omitted section or field falls back to a sensible default, so an empty
//! file (or no file at all) yields a runnable configuration.
//!
//! ## Example configuration file
//!
//! ```toml
//! [server]
//! listen = "127.0.0.1:8080"
//!
//! [poll]
//! interval_secs = 30
//!
//! [workspace]
//! root = "/var/lib/docswap"
//!
//! [generator]
//! program = "godoc"
//! args = ["-analysis=type,pointer"]
//! readiness_marker = "Analysis complete"
//! startup_timeout_secs = 600
//! workspace_env = "GOPATH"
//!
//! [fetch]
//! program = "git"
//!
//! [[fetch.dependencies]]
//! name = "crypto"
//! url = "https://github.com/dedis/crypto"
//! ```

use crate::{Error, Result, Side};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Inbound HTTP proxy settings.
    pub server: ServerConfig,
    /// Change-detection polling cadence.
    pub poll: PollConfig,
    /// On-disk workspace layout.
    pub workspace: WorkspaceConfig,
    /// Generator backend process settings.
    pub generator: GeneratorConfig,
    /// External dependency-fetch settings.
    pub fetch: FetchConfig,
}

/// Inbound HTTP proxy settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the proxy listens on.
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8080".to_string(),
        }
    }
}

/// Change-detection polling cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Seconds to sleep between change-detection ticks.
    pub interval_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self { interval_secs: 30 }
    }
}

/// On-disk workspace layout.
///
/// Each side owns an isolated subdirectory of `root`; dependency checkouts
/// live under `<side root>/deps/<name>`. The two side roots are the unit
/// of isolation: a rebuild only ever writes inside its own side's root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Root directory holding both side workspaces.
    pub root: PathBuf,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root: std::env::temp_dir().join("docswap"),
        }
    }
}

/// Generator backend process settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Program to spawn for each side's backend.
    pub program: String,
    /// Fixed flags appended after the `--http=<endpoint>` argument.
    pub args: Vec<String>,
    /// Substring of a diagnostic line that signals the backend is ready.
    pub readiness_marker: String,
    /// Maximum seconds to wait for the readiness marker.
    pub startup_timeout_secs: u64,
    /// Environment variable that receives the side's workspace root.
    pub workspace_env: String,
    /// Endpoint side A's backend binds to.
    pub side_a_endpoint: String,
    /// Endpoint side B's backend binds to.
    pub side_b_endpoint: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            program: "godoc".to_string(),
            args: vec!["-analysis=type,pointer".to_string()],
            readiness_marker: "Analysis complete".to_string(),
            startup_timeout_secs: 600,
            workspace_env: "GOPATH".to_string(),
            side_a_endpoint: "127.0.0.1:8081".to_string(),
            side_b_endpoint: "127.0.0.1:8082".to_string(),
        }
    }
}

/// External dependency-fetch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Source-control program used for all fetch operations.
    pub program: String,
    /// Optional toolchain refresh step, run in the side root before any
    /// dependency update. Empty means no toolchain step.
    pub toolchain_refresh_args: Vec<String>,
    /// Dependencies tracked per side workspace.
    pub dependencies: Vec<Dependency>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            program: "git".to_string(),
            toolchain_refresh_args: Vec::new(),
            dependencies: Vec::new(),
        }
    }
}

/// One tracked dependency source tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dependency {
    /// Checkout directory name under `<side root>/deps/`.
    pub name: String,
    /// Clone URL.
    pub url: String,
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::parse(&raw)
    }

    /// Parses configuration from a TOML string.
    pub fn parse(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config(format!("invalid config: {e}")))
    }

    /// Workspace root for one side.
    pub fn side_root(&self, side: Side) -> PathBuf {
        self.workspace.root.join(side.dir_name())
    }

    /// Checkout directory for one dependency in one side's workspace.
    pub fn dependency_dir(&self, side: Side, dep: &Dependency) -> PathBuf {
        self.side_root(side).join("deps").join(&dep.name)
    }

    /// Endpoint the given side's backend binds to.
    pub fn side_endpoint(&self, side: Side) -> &str {
        match side {
            Side::A => &self.generator.side_a_endpoint,
            Side::B => &self.generator.side_b_endpoint,
        }
    }

    /// Sleep interval between change-detection ticks.
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll.interval_secs)
    }

    /// Maximum time to wait for a backend's readiness marker.
    pub const fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.generator.startup_timeout_secs)
    }
}
