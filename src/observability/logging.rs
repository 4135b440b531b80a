//! Structured logging.
//!
//! # Responsibilities
//! - Build the stdout formatting layer (plain or JSON)
//! - Resolve the log filter from `RUST_LOG` or the configured level
//!
//! # Design Decisions
//! - The filter is attached to the fmt layer only, so log verbosity never
//!   decides which spans reach the trace exporter
//! - JSON output carries the current span so log lines can be joined to traces

use tracing::Subscriber;
use tracing_subscriber::filter::{EnvFilter, Filtered};
use tracing_subscriber::fmt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

use super::TelemetryError;

/// Boxed fmt layer with its own filter.
pub type LogLayer<S> = Filtered<Box<dyn Layer<S> + Send + Sync + 'static>, EnvFilter, S>;

/// `RUST_LOG` wins over the configured level when set.
pub fn env_filter(level: &str) -> Result<EnvFilter, TelemetryError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level).map_err(|e| TelemetryError::Filter {
            directive: level.to_string(),
            reason: e.to_string(),
        }),
    }
}

pub fn log_layer<S>(json: bool, filter: EnvFilter) -> LogLayer<S>
where
    S: Subscriber + for<'span> LookupSpan<'span> + 'static,
{
    let layer = if json {
        fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .with_span_list(false)
            .boxed()
    } else {
        fmt::layer().with_target(true).boxed()
    };
    layer.with_filter(filter)
}
