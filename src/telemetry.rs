//! Logging initialization
//!
//! Structured logging with tracing. The filter is taken from `LIGHTS_LOG`,
//! falling back to `RUST_LOG`, falling back to the given default level.

use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

/// Initialize the logging system
///
/// Safe to call once per process; returns an error string if a global
/// subscriber is already installed.
pub fn init_logging(default_level: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = EnvFilter::try_from_env("LIGHTS_LOG")
        .or_else(|_| EnvFilter::try_from_env("RUST_LOG"))
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .try_init()?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Logging initialized"
    );

    Ok(())
}
