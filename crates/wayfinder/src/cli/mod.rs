//! Command-line interface for wayfinder.
//!
//! This module provides the CLI structure for the `wayfind` binary.

mod commands;
mod console;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{ConfigCommand, NavigateCommand, OutputFormat, RouteCommand};
pub use console::{ConsoleCommand, UnknownCommand, CONSOLE_HELP};

use crate::logging::Verbosity;

/// wayfind - Turn-by-turn guidance along a prepared route
///
/// Follows a route step by step from a live (or simulated) location feed,
/// announcing instructions and keeping the arrival estimate current.
#[derive(Debug, Parser)]
#[command(name = "wayfind")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Navigate a route
    Navigate(NavigateCommand),

    /// Inspect route files
    #[command(subcommand)]
    Route(RouteCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.verbose, self.quiet)
    }
}
