//! Command-line interface for the docswap daemon.

use clap::Parser;
use std::path::PathBuf;

/// Blue-green proxy for generated documentation.
///
/// Serves documentation from whichever side is live while the other side
/// is rebuilt in the background; control flips atomically once the rebuilt
/// backend announces readiness.
#[derive(Parser, Clone, Debug)]
#[command(name = "docswap")]
#[command(version)]
#[command(about = "docswap - blue-green proxy for generated documentation", long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file; defaults apply when omitted
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Override the configured listen address
    #[arg(long, value_name = "ADDR")]
    pub listen: Option<String>,

    /// Enable verbose logging output
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Enable debug-level logging
    #[arg(long)]
    pub debug: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_config_and_listen_overrides() {
        let cli = Cli::parse_from([
            "docswap",
            "--config",
            "/etc/docswap.toml",
            "--listen",
            "0.0.0.0:9090",
            "-v",
        ]);
        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("/etc/docswap.toml")));
        assert_eq!(cli.listen.as_deref(), Some("0.0.0.0:9090"));
        assert!(cli.verbose);
        assert!(!cli.debug);
    }

    #[test]
    fn runs_with_no_arguments() {
        let cli = Cli::parse_from(["docswap"]);
        assert!(cli.config.is_none());
        assert!(cli.listen.is_none());
    }
}
