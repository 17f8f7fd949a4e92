// src/logging.rs

//! `tracing` subscriber setup for the `wfsim` binary.
//!
//! The filter is taken from, in order:
//! 1. `--log-level` (a single level for every target)
//! 2. the `WFSIM_LOG` directive string, e.g. `info` or
//!    `warn,wfsim::engine=debug`
//! 3. `info`
//!
//! Wall-clock timestamps are left out; simulation events carry their
//! simulated time as a field. Logs go to STDERR, the experiment summary to
//! STDOUT.

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

/// Environment variable holding the default filter directives.
pub const LOG_ENV: &str = "WFSIM_LOG";

/// Install the global subscriber. Fails if one is already installed or if
/// `WFSIM_LOG` does not parse.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = match cli_level {
        Some(level) => EnvFilter::new(level.directive()),
        None => filter_from_env()?,
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .without_time()
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("installing tracing subscriber: {err}"))
}

fn filter_from_env() -> Result<EnvFilter> {
    match std::env::var(LOG_ENV) {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives.trim())
            .with_context(|| format!("invalid {LOG_ENV} directives {directives:?}")),
        _ => Ok(EnvFilter::new("info")),
    }
}
