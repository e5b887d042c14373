//! Structured logging (spec §2 layer K): `tracing` + `tracing-subscriber`,
//! level driven by `TASKCTL_LOG_LEVEL` via [`crate::config::Config`].

use tracing_subscriber::EnvFilter;

/// Initialise the global tracing subscriber. Safe to call more than once
/// (subsequent calls are no-ops) so tests can call it freely.
pub fn init(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
