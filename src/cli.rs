// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::types::CompilerKind;

/// Command-line arguments for `devtasks`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "devtasks",
    version,
    about = "Build stylesheets, watch them, and reset the local database.",
    long_about = None
)]
pub struct CliArgs {
    /// Tasks to run, in dependency order. Defaults to `default`.
    #[arg(value_name = "TASK")]
    pub tasks: Vec<String>,

    /// Project root; all configured paths are relative to it.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub root: PathBuf,

    /// Path to the config file (TOML).
    ///
    /// Default: `Devtasks.toml` in the project root, if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace). Default: info.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Override `[styles] compiler` (sass or rsass).
    #[arg(long, value_name = "NAME")]
    pub compiler: Option<CompilerKind>,

    /// Resolve and print the task chain without executing anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Print every registered task and exit.
    #[arg(long)]
    pub list: bool,
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
