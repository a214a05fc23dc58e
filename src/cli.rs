//! Command-line interface definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// AI-augmented project management service
#[derive(Debug, Parser)]
#[command(name = "storyforge", version, about)]
pub struct Cli {
    /// Path to a config file (overrides the lookup chain)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level: trace, debug, info, warn, error
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the service in the foreground
    Serve,

    /// Check whether a running service is responsive
    Ping,
}

/// Path to the service log file
pub fn get_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("storyforge")
        .join("logs")
        .join("storyforge.log")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve() {
        let cli = Cli::parse_from(["storyforge", "serve"]);
        assert!(matches!(cli.command, Command::Serve));
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_parse_ping_with_config() {
        let cli = Cli::parse_from(["storyforge", "ping", "--config", "/tmp/cfg.yml"]);
        assert!(matches!(cli.command, Command::Ping));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/cfg.yml")));
    }
}
