//! Command line interface for the triage daemon.

use std::path::PathBuf;

use clap::Parser;

/// AI incident triage and staff assignment daemon.
#[derive(Debug, Parser)]
#[command(name = "triaged", version, about)]
pub struct Cli {
    /// Path to the configuration file.
    #[arg(long, default_value = "triaged.toml")]
    pub config: PathBuf,

    /// Bind address override.
    #[arg(long)]
    pub host: Option<String>,

    /// Bind port override.
    #[arg(long)]
    pub port: Option<u16>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_defaults() {
        let cli = Cli::parse_from(["triaged"]);
        assert_eq!(cli.config, PathBuf::from("triaged.toml"));
        assert!(cli.host.is_none());
        assert!(cli.port.is_none());
    }

    #[test]
    fn cli_parses_overrides() {
        let cli = Cli::parse_from([
            "triaged",
            "--config",
            "/etc/triaged/triaged.toml",
            "--host",
            "127.0.0.1",
            "--port",
            "9000",
        ]);
        assert_eq!(cli.config, PathBuf::from("/etc/triaged/triaged.toml"));
        assert_eq!(cli.host.as_deref(), Some("127.0.0.1"));
        assert_eq!(cli.port, Some(9000));
    }

    #[test]
    fn cli_verify() {
        Cli::command().debug_assert();
    }
}
