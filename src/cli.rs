// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `wfsim`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "wfsim",
    version,
    about = "Simulate budget- and deadline-constrained workflow ensembles on a simulated cloud.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the experiment file (TOML).
    ///
    /// DAG paths inside it are resolved relative to its directory.
    #[arg(long, value_name = "PATH", default_value = "experiment.toml")]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `WFSIM_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Load and validate the experiment and its DAGs, print the plan, but
    /// don't simulate.
    #[arg(long)]
    pub dry_run: bool,

    /// Also print per-VM and per-job tables after the summary.
    #[arg(long, short)]
    pub verbose: bool,
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

impl LogLevel {
    /// `EnvFilter` directive enabling this level for every target.
    pub fn directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
