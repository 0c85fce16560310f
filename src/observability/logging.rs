//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once at startup
//! - Pick the level from `RUST_LOG`, then the debug flag, then config
//! - Choose JSON or human readable output
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format by default, pretty format for development
//! - Logs go to stderr; stdout stays free

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ObservabilityConfig};

/// Build the level filter.
pub fn build_filter(config: &ObservabilityConfig, debug: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if debug { "debug" } else { config.log_level.as_str() };
        EnvFilter::new(level)
    })
}

/// Install the global subscriber.
pub fn init_logging(
    config: &ObservabilityConfig,
    debug: bool,
) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = build_filter(config, debug);
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_file(true)
                    .with_line_number(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init(),
    }
}
