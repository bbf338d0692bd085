// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CLI argument parsing and command definitions.
//!
//! - `validate`: Validate the settings file
//! - `list`: Show configured endpoints or writer groups
//! - `publish` / `unpublish` / `unpublish-all`: Edit the published nodes
//! - `nodes`: Show the nodes of one dataset
//! - `resolve`: Resolve event fields against the type catalog
//! - `version`: Show version information

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

// =============================================================================
// Main CLI Structure
// =============================================================================

/// edgepub - OPC UA publisher configuration
///
/// Maintains the published nodes file and the writer groups derived from it.
#[derive(Parser, Debug)]
#[command(
    name = "edgepub",
    author = "Sylvex <contact@sylvex.io>",
    version = edgepub_core::VERSION,
    about = "OPC UA publisher configuration engine",
    long_about = None,
    propagate_version = true
)]
pub struct Cli {
    /// Settings file path
    #[arg(
        short,
        long,
        default_value = "edgepub.yaml",
        env = "EDGEPUB_CONFIG",
        global = true
    )]
    pub config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides the settings file
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Log format (text, json, compact); overrides the settings file
    #[arg(long, global = true)]
    pub log_format: Option<LogFormat>,

    /// Enable quiet mode (warnings and errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

// =============================================================================
// Subcommands
// =============================================================================

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Validate the settings file and the published nodes file
    Validate(ValidateArgs),

    /// List configured endpoints or derived writer groups
    List(ListArgs),

    /// Publish the nodes of a request file
    Publish(RequestArgs),

    /// Unpublish the nodes of a request file
    Unpublish(RequestArgs),

    /// Remove every dataset matching a request file, or everything
    #[command(name = "unpublish-all")]
    UnpublishAll(UnpublishAllArgs),

    /// Show the nodes published for the dataset of a request file
    Nodes(NodesArgs),

    /// Resolve event fields of the configured event subscriptions
    Resolve(ResolveArgs),

    /// Show detailed version information
    Version,
}

// =============================================================================
// Command Arguments
// =============================================================================

/// Arguments for the `validate` command.
#[derive(Args, Debug, Default, Clone)]
pub struct ValidateArgs {
    /// Output format for validation results
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the `list` command.
#[derive(Args, Debug, Default, Clone)]
pub struct ListArgs {
    /// Include nodes
    #[arg(short, long)]
    pub nodes: bool,

    /// Show derived writer groups instead of entries
    #[arg(short, long)]
    pub groups: bool,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// A request read from a JSON file holding one entry.
#[derive(Args, Debug, Clone)]
pub struct RequestArgs {
    /// Request file path
    pub file: PathBuf,
}

/// Arguments for the `unpublish-all` command.
#[derive(Args, Debug, Default, Clone)]
pub struct UnpublishAllArgs {
    /// Request file path; without it every dataset is removed
    pub file: Option<PathBuf>,
}

/// Arguments for the `nodes` command.
#[derive(Args, Debug, Clone)]
pub struct NodesArgs {
    /// Request file path
    pub file: PathBuf,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the `resolve` command.
#[derive(Args, Debug, Default, Clone)]
pub struct ResolveArgs {
    /// JSON file with additional type nodes; overrides the settings file
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

// =============================================================================
// Enums
// =============================================================================

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for structured logging
    Json,
    /// Compact format for minimal output
    Compact,
}

impl From<edgepub_config::LogFormat> for LogFormat {
    fn from(format: edgepub_config::LogFormat) -> Self {
        match format {
            edgepub_config::LogFormat::Text => LogFormat::Text,
            edgepub_config::LogFormat::Json => LogFormat::Json,
            edgepub_config::LogFormat::Compact => LogFormat::Compact,
        }
    }
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for programmatic parsing
    Json,
}

// =============================================================================
// Helper Methods
// =============================================================================

impl Cli {
    /// Parse CLI arguments from the command line.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the log level after applying flags, falling back to the
    /// settings file value.
    pub fn effective_log_level<'a>(&'a self, configured: &'a str) -> &'a str {
        if self.quiet {
            "warn"
        } else if self.verbose {
            "debug"
        } else {
            self.log_level.as_deref().unwrap_or(configured)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_command() {
        let cli = Cli::parse_from(["edgepub", "list", "--nodes", "-f", "json"]);
        if let Commands::List(args) = cli.command {
            assert!(args.nodes);
            assert!(!args.groups);
            assert_eq!(args.format, OutputFormat::Json);
        } else {
            panic!("Expected List command");
        }
    }

    #[test]
    fn test_unpublish_all_without_file() {
        let cli = Cli::parse_from(["edgepub", "unpublish-all"]);
        assert!(matches!(cli.command, Commands::UnpublishAll(UnpublishAllArgs { file: None })));
    }

    #[test]
    fn test_config_path() {
        let cli = Cli::parse_from(["edgepub", "-c", "/etc/edgepub/edgepub.yaml", "version"]);
        assert_eq!(cli.config, PathBuf::from("/etc/edgepub/edgepub.yaml"));
    }

    #[test]
    fn test_log_level_precedence() {
        let cli = Cli::parse_from(["edgepub", "version"]);
        assert_eq!(cli.effective_log_level("error"), "error");

        let cli = Cli::parse_from(["edgepub", "-l", "debug", "version"]);
        assert_eq!(cli.effective_log_level("error"), "debug");

        let cli = Cli::parse_from(["edgepub", "-q", "-l", "debug", "version"]);
        assert_eq!(cli.effective_log_level("error"), "warn");
    }

    #[test]
    fn test_publish_requires_file() {
        assert!(Cli::try_parse_from(["edgepub", "publish"]).is_err());
        let cli = Cli::parse_from(["edgepub", "publish", "request.json"]);
        assert!(matches!(cli.command, Commands::Publish(_)));
    }
}
