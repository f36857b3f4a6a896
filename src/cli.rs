// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `hybrid-dag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "hybrid-dag",
    version,
    about = "Run a guarded agent DAG once over an input text.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to a DAG config file (TOML).
    ///
    /// Without it the built-in parse → claims → reduce demo DAG is used.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Input text, or `@path/to/file.txt` to read it from a file.
    #[arg(long, value_name = "TEXT")]
    pub input: Option<String>,

    /// Override the concurrency cap from the config.
    #[arg(long, value_name = "N")]
    pub max_concurrency: Option<usize>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `HYBRID_DAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Validate and print the DAG, but don't run any agent.
    #[arg(long)]
    pub dry_run: bool,

    /// Print each node's guard verdicts as JSON after the results.
    #[arg(long)]
    pub show_moderation: bool,
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
