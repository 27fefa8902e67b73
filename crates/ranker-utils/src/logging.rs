//! Logging and tracing utilities

use crate::LogFormat;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "info";

/// Initialize the global tracing subscriber
///
/// Events go to stderr so stdout stays free for command output. `RUST_LOG`
/// overrides the default `info` filter. Panics if a subscriber is
/// already installed; use [`try_init_tracing`] where that can happen.
pub fn init_tracing(format: LogFormat) {
    if let Err(e) = try_init_tracing(format) {
        panic!("failed to install tracing subscriber: {e}");
    }
}

/// Initialize the global tracing subscriber, reporting a second install as an error
pub fn try_init_tracing(
    format: LogFormat,
) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    }
}
