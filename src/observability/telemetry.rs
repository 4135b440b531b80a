//! Tracer provider and subscriber bootstrap.
//!
//! # Responsibilities
//! - Build the OTLP/gRPC exporter and batch span processor
//! - Install the global `tracing` subscriber exactly once per process
//! - Flush buffered spans on shutdown via [`TelemetryGuard`]

use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::{self, RandomIdGenerator, Sampler, Tracer, TracerProvider};
use opentelemetry_sdk::{runtime, Resource};
use thiserror::Error;
use tracing::{Level, Subscriber};
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::filter::{Filtered, Targets};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

use super::logging;
use crate::config::ObservabilityConfig;

/// Only this crate's spans are exported; request-level spans from
/// `tower_http` stay in the logs.
pub const TRACE_TARGET: &str = "cep_weather";

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to initialize trace exporter: {0}")]
    Exporter(#[from] opentelemetry::trace::TraceError),

    #[error("invalid log filter {directive:?}: {reason}")]
    Filter { directive: String, reason: String },

    #[error("global subscriber already installed: {0}")]
    Subscriber(String),
}

/// OpenTelemetry layer restricted to [`TRACE_TARGET`] at INFO and above.
pub type SpanExportLayer<S> = Filtered<OpenTelemetryLayer<S, Tracer>, Targets, S>;

pub fn trace_layer<S>(tracer: Tracer) -> SpanExportLayer<S>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    tracing_opentelemetry::layer()
        .with_tracer(tracer)
        .with_filter(Targets::new().with_target(TRACE_TARGET, Level::INFO))
}

/// Build a provider exporting to `config.otlp_endpoint` through a batch processor.
pub fn build_tracer_provider(config: &ObservabilityConfig) -> Result<TracerProvider, TelemetryError> {
    let exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(config.otlp_endpoint.clone());

    let provider = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(exporter)
        .with_trace_config(
            trace::Config::default()
                .with_sampler(Sampler::AlwaysOn)
                .with_id_generator(RandomIdGenerator::default())
                .with_resource(Resource::new(vec![
                    KeyValue::new("service.name", config.service_name.clone()),
                    KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
                ])),
        )
        .install_batch(runtime::Tokio)?;

    Ok(provider)
}

/// Flushes and shuts down the tracer provider when dropped.
#[must_use = "dropping the guard shuts down trace export"]
pub struct TelemetryGuard {
    provider: Option<TracerProvider>,
}

impl TelemetryGuard {
    pub fn traces_enabled(&self) -> bool {
        self.provider.is_some()
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.provider.take() {
            if let Err(e) = provider.shutdown() {
                eprintln!("failed to flush traces on shutdown: {e}");
            }
        }
    }
}

/// Install the process-wide subscriber.
///
/// Must be called from within a Tokio runtime when traces are enabled.
pub fn init_telemetry(config: &ObservabilityConfig) -> Result<TelemetryGuard, TelemetryError> {
    let provider = if config.traces_enabled {
        Some(build_tracer_provider(config)?)
    } else {
        None
    };

    let export_layer = provider
        .as_ref()
        .map(|provider| trace_layer(provider.tracer(config.service_name.clone())));

    tracing_subscriber::registry()
        .with(export_layer)
        .with(logging::log_layer(
            config.json_logs,
            logging::env_filter(&config.log_level)?,
        ))
        .try_init()
        .map_err(|e| TelemetryError::Subscriber(e.to_string()))?;

    Ok(TelemetryGuard { provider })
}
