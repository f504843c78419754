//! Tracing setup
//!
//! `RUST_LOG` takes precedence over the configured level. `log` records
//! emitted by the storage backends are forwarded into the same subscriber.

use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber. Returns `false` if one was already set.
pub fn init_tracing(level: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).try_init().is_ok()
}

/// Same as [`init_tracing`] with JSON lines output.
pub fn init_json_tracing(level: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .try_init()
        .is_ok()
}
