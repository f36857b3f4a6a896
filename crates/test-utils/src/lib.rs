//! Shared fixtures for `hybrid-dag` integration tests: builders, agents and
//! guards with observable counters, plus tracing and timeout helpers.

pub mod builders;
pub mod fake_agents;
pub mod fake_guards;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

/// Route scheduler logs through the test harness.
///
/// Output is captured per test and only shown for failures (or with
/// `--nocapture`). The filter is read from `RUST_LOG`, defaulting to
/// `hybrid_dag=debug`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("hybrid_dag=debug"));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Fail the test if `fut` has not resolved within five seconds.
pub async fn with_timeout<F: Future>(fut: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(5), fut)
        .await
        .expect("test timed out after 5 seconds")
}
