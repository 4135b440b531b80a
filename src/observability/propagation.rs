//! W3C Trace Context propagation over HTTP headers.
//!
//! Outbound requests carry `traceparent` (and `tracestate` when present)
//! derived from the calling span. Inbound requests that carry a valid
//! `traceparent` have their handler span re-parented onto the remote caller,
//! so both services land in one trace.

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use opentelemetry::propagation::{Extractor, Injector, TextMapPropagator};
use opentelemetry::trace::TraceContextExt;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// Writes propagation fields into an outbound header map.
pub struct HeaderInjector<'a>(pub &'a mut HeaderMap);

impl Injector for HeaderInjector<'_> {
    fn set(&mut self, key: &str, value: String) {
        match (
            HeaderName::from_bytes(key.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            (Ok(name), Ok(value)) => {
                self.0.insert(name, value);
            }
            _ => tracing::debug!(key, "skipping propagation field that is not a valid header"),
        }
    }
}

/// Reads propagation fields from an inbound header map.
pub struct HeaderExtractor<'a>(pub &'a HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|value| value.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(HeaderName::as_str).collect()
    }
}

/// Inject the context of `span` into `headers`.
///
/// Adds nothing when `span` is not exported (no trace layer installed).
pub fn inject_context(span: &Span, headers: &mut HeaderMap) {
    let cx = span.context();
    TraceContextPropagator::new().inject_context(&cx, &mut HeaderInjector(headers));
}

/// Make `span` a child of the remote caller described by `headers`.
///
/// Returns `false` (and leaves `span` as a root) when no valid context is
/// present; malformed headers are not an error.
pub fn continue_trace(span: &Span, headers: &HeaderMap) -> bool {
    let cx = TraceContextPropagator::new().extract(&HeaderExtractor(headers));
    let remote = cx.span().span_context().is_valid();
    if remote {
        span.set_parent(cx);
    }
    remote
}
