//! Tracing setup for the binary. Library code only emits events.

use std::io;
use tracing_subscriber::EnvFilter;

/// Environment variable holding an `EnvFilter` directive, e.g. `spelunk=debug`
pub const LOG_ENV: &str = "SPELUNK_LOG";

/// Install a stderr subscriber. `default_level` applies when `SPELUNK_LOG`
/// is unset or invalid. Calling this twice is harmless.
pub fn init(default_level: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}
