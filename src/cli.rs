// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `taskexplorer`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "taskexplorer",
    version,
    about = "Discover runnable tasks in build files and keep the task tree in sync.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// A missing file at the default location means "all defaults".
    #[arg(long, value_name = "PATH", default_value = "Taskexplorer.toml")]
    pub config: String,

    /// Workspace folder to scan. May be given several times.
    ///
    /// Default: the current working directory.
    #[arg(long = "root", value_name = "DIR")]
    pub roots: Vec<String>,

    /// Scan once, print the task tree and exit. No watching.
    #[arg(long)]
    pub once: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TASKEXPLORER_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate the config and print the effective settings.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
