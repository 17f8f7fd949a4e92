//! Shared helpers for the `wfsim` integration tests: builders for DAGs and
//! experiment configs, synthetic DAG fixtures and a scripted probe entity.

pub mod builders;
pub mod fixtures;
pub mod probe;

use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt};
use wfsim::logging::LOG_ENV;

static INIT: Once = Once::new();

/// Initialise tracing for tests, once per test binary.
///
/// Output goes through the test writer, so it only shows for failing tests
/// (or with `-- --nocapture`). Filters come from `WFSIM_LOG`, e.g.
/// `WFSIM_LOG=wfsim::engine=debug cargo test`; the default is `warn` since
/// ensemble runs log every VM and job milestone at `info`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .without_time()
            .with_target(true)
            .init();
    });
}
