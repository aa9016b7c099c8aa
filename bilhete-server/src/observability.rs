//! Observability bootstrap for the bilhete server.
//!
//! Structured logging via tracing-subscriber, with a human-readable format
//! for development and JSON for production log aggregation.

use std::io;

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format for development.
    Pretty,
    /// JSON format for log aggregation.
    Json,
}

impl LogFormat {
    /// Reads the format from the `LOG_FORMAT` environment variable.
    ///
    /// `json` selects JSON output; anything else (including unset) selects
    /// the pretty format.
    #[must_use]
    pub fn from_env() -> Self {
        match std::env::var("LOG_FORMAT").unwrap_or_default().to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Initializes structured logging.
///
/// Log level filtering comes from `RUST_LOG` (default `info`). Span-close
/// events are emitted so request handling durations show up in the logs.
pub fn init_observability(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Pretty => {
            subscriber
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_span_events(FmtSpan::CLOSE)
                        .with_writer(io::stderr),
                )
                .init();
        }
        LogFormat::Json => {
            subscriber
                .with(
                    fmt::layer()
                        .json()
                        .with_current_span(true)
                        .with_span_list(true)
                        .with_target(true)
                        .with_span_events(FmtSpan::CLOSE)
                        .with_writer(io::stderr),
                )
                .init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_defaults_to_pretty() {
        // Unset or unrecognized values select the development format.
        std::env::remove_var("LOG_FORMAT");
        assert_eq!(LogFormat::from_env(), LogFormat::Pretty);
    }
}
