//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for spl-extract using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// spl-extract - structured extraction for SPL drug label documents
#[derive(Parser, Debug)]
#[command(name = "spl-extract")]
#[command(version, about, long_about = None)]
#[command(author = "spl-extract Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "spl-extract.toml", env = "SPL_EXTRACT_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "SPL_EXTRACT_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse every label in a directory and write the results
    Process(commands::process::ProcessArgs),

    /// Parse a single label and print it as JSON
    Parse(commands::parse::ParseArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Show tracked fingerprints
    Status(commands::status::StatusArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_process() {
        let cli = Cli::parse_from(["spl-extract", "process", "--input", "labels"]);
        assert_eq!(cli.config, "spl-extract.toml");
        assert!(matches!(cli.command, Commands::Process(_)));
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["spl-extract", "--config", "custom.toml", "status"]);
        assert_eq!(cli.config, "custom.toml");
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["spl-extract", "--log-level", "debug", "status"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_cli_parse_parse() {
        let cli = Cli::parse_from(["spl-extract", "parse", "label.xml", "--pretty"]);
        match cli.command {
            Commands::Parse(args) => {
                assert_eq!(args.file.to_str(), Some("label.xml"));
                assert!(args.pretty);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_validate_config() {
        let cli = Cli::parse_from(["spl-extract", "validate-config"]);
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["spl-extract", "init"]);
        assert!(matches!(cli.command, Commands::Init(_)));
    }
}
