//! Error types and handling for docswap-core operations.
//!
//! Errors are split along the system's failure taxonomy: bootstrap failures
//! are fatal and abort startup, cycle failures are recoverable (the live
//! side keeps serving), and the distinction is carried by the call site,
//! not the error type. What the type does carry is a category for logging
//! and a recoverability hint for the orchestrator loop.

use crate::Side;
use thiserror::Error;

/// The main error type for docswap-core operations.
///
/// All fallible public functions in this crate return `Result<T, Error>`.
/// `Display` gives user-facing messages; the full chain is preserved via
/// `source()` where an underlying error exists.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation failed.
    ///
    /// Covers workspace directory creation, spawning external processes,
    /// and reading a backend's diagnostic stream.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration is missing, unreadable, or malformed.
    #[error("Config error: {0}")]
    Config(String),

    /// An external command exited unsuccessfully.
    ///
    /// Raised by the build pipeline when a toolchain refresh or a
    /// dependency update reports a non-zero exit status. The change
    /// detector never raises this; it absorbs command failures as
    /// "no change detected".
    #[error("command `{program}` failed: {detail}")]
    CommandFailed {
        /// Program that was invoked.
        program: String,
        /// Exit status or a short description of what went wrong.
        detail: String,
    },

    /// A backend process ended (or closed its diagnostic stream) before
    /// announcing readiness.
    #[error("backend for side {side} exited before becoming ready: {detail}")]
    BackendExited {
        /// Side whose backend failed.
        side: Side,
        /// What was observed: stream closed, read error, spawn failure.
        detail: String,
    },

    /// A backend process did not announce readiness within the configured
    /// startup timeout.
    #[error("backend for side {side} not ready after {waited_secs}s")]
    ReadinessTimeout {
        /// Side whose backend timed out.
        side: Side,
        /// How long the supervisor waited.
        waited_secs: u64,
    },
}

impl Error {
    /// Returns a coarse category name, used in log fields.
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Config(_) => "config",
            Self::CommandFailed { .. } => "command",
            Self::BackendExited { .. } | Self::ReadinessTimeout { .. } => "backend",
        }
    }

    /// Whether a later cycle could plausibly succeed without operator
    /// intervention.
    ///
    /// Everything except a configuration error is recoverable: commands
    /// fail transiently (network), backends can succeed on the next
    /// rebuild. A bad config will fail the same way every tick.
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Config(_))
    }
}

/// Result alias used throughout docswap-core.
pub type Result<T, E = Error> = std::result::Result<T, E>;
