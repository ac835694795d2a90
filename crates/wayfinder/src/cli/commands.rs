//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

/// Navigate command arguments.
#[derive(Debug, Args)]
pub struct NavigateCommand {
    /// Route JSON file
    pub route: PathBuf,

    /// Replay samples from a JSON track file instead of simulating a walk
    #[arg(short, long, value_name = "FILE")]
    pub track: Option<PathBuf>,

    /// Simulated travel speed in meters per second
    #[arg(short, long)]
    pub speed: Option<f64>,

    /// Milliseconds between location samples
    #[arg(short, long)]
    pub interval_ms: Option<u64>,

    /// Start with voice guidance off
    #[arg(long)]
    pub no_voice: bool,

    /// Print the session summary as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Route inspection commands.
#[derive(Debug, Subcommand)]
pub enum RouteCommand {
    /// Print a route's steps
    Show {
        /// Route JSON file
        route: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Check a route file for errors
    Validate {
        /// Route JSON file
        route: PathBuf,
    },

    /// Print the synthetic track a simulated walk would follow
    Simulate {
        /// Route JSON file
        route: PathBuf,

        /// Simulated travel speed in meters per second
        #[arg(short, long)]
        speed: Option<f64>,

        /// Milliseconds between samples
        #[arg(short, long)]
        interval_ms: Option<u64>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Formatted table
    #[default]
    Table,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Table);
    }

    #[test]
    fn test_navigate_command_debug() {
        let cmd = NavigateCommand {
            route: PathBuf::from("route.json"),
            track: None,
            speed: Some(1.2),
            interval_ms: None,
            no_voice: true,
            json: false,
        };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("route.json"));
        assert!(debug_str.contains("no_voice"));
    }

    #[test]
    fn test_route_command_debug() {
        let cmd = RouteCommand::Validate {
            route: PathBuf::from("trip.json"),
        };
        assert!(format!("{cmd:?}").contains("Validate"));
    }

    #[test]
    fn test_config_command_debug() {
        let cmd = ConfigCommand::Show { json: false };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("Show"));
    }
}
