//! Structured logging with `tracing`.
//!
//! One-shot subscriber initialization for binaries and integration
//! tests. Library code only emits events; it never installs a
//! subscriber.

use tracing_subscriber::EnvFilter;

/// Environment variable controlling the log filter.
pub const LOG_ENV_VAR: &str = "CHRONOLEX_LOG";

/// Install the global tracing subscriber.
///
/// Filter comes from `CHRONOLEX_LOG` (standard `tracing` directive
/// syntax), defaulting to `info`. Safe to call more than once; later
/// calls are no-ops.
pub fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
