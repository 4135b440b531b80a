//! Span names, attribute keys and the scoped span guard.
//!
//! Every logical operation opens exactly one span through [`SpanScope`]. The
//! scope is closed with the operation's result; if the enclosing future is
//! dropped first (client disconnect, timeout) the span is still closed, with
//! status `ERROR` and the [`CANCELLED`] description.

use std::error::Error;

use tracing::Span;

/// Span names exported to the trace backend.
pub mod names {
    pub const CEP_HANDLER: &str = "cep_handler";
    pub const CALL_ORCHESTRATOR: &str = "call_service_b";
    pub const WEATHER_HANDLER: &str = "weather_handler";
    pub const GET_CEP_INFO: &str = "get_cep_info";
    pub const GET_WEATHER_INFO: &str = "get_weather_info";
}

/// Attribute keys recorded after a span has been created.
///
/// Each key must also be declared (as `tracing::field::Empty`) when the span
/// is built, otherwise `Span::record` drops the value.
pub mod attrs {
    pub const STATUS_CODE: &str = "otel.status_code";
    pub const STATUS_MESSAGE: &str = "otel.status_message";
    pub const STAGE: &str = "stage";
    pub const VALIDATION: &str = "validation";
    pub const ERROR: &str = "error";
    pub const CEP: &str = "cep";
    pub const HTTP_STATUS_CODE: &str = "http.status_code";
    pub const CEP_FOUND: &str = "cep.found";
    pub const LOCALIDADE: &str = "localidade";
    pub const UF: &str = "uf";
    pub const WEATHER_LOCATION: &str = "weather.location";
    pub const WEATHER_TEMP_C: &str = "weather.temp_c";
    pub const WEATHER_CONDITION: &str = "weather.condition";
    pub const CITY: &str = "city";
    pub const TEMP_C: &str = "temp_c";
    pub const RESPONSE_CITY: &str = "response.city";
    pub const RESPONSE_TEMP_C: &str = "response.temp_c";
    pub const RESPONSE_TEMP_F: &str = "response.temp_f";
    pub const RESPONSE_TEMP_K: &str = "response.temp_k";
}

/// Status description of a span whose operation never completed.
pub const CANCELLED: &str = "operation cancelled before completion";

/// Owns the span of one operation until its result is known.
#[must_use = "a SpanScope dropped without `close` is reported as cancelled"]
#[derive(Debug)]
pub struct SpanScope {
    span: Span,
    closed: bool,
}

impl SpanScope {
    pub fn open(span: Span) -> Self {
        Self {
            span,
            closed: false,
        }
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Mark the span as failed and attach the error as a span event.
    pub fn record_error<E>(&self, error: &E)
    where
        E: Error + 'static,
    {
        mark_error(&self.span, &error.to_string());
        tracing::warn!(
            parent: &self.span,
            error = error as &(dyn Error + 'static),
            "operation failed"
        );
    }

    /// Finish the operation. Errors are recorded before the span closes.
    pub fn close<T, E>(mut self, result: Result<T, E>) -> Result<T, E>
    where
        E: Error + 'static,
    {
        if let Err(error) = &result {
            self.record_error(error);
        }
        self.closed = true;
        result
    }
}

impl Drop for SpanScope {
    fn drop(&mut self) {
        if !self.closed {
            mark_error(&self.span, CANCELLED);
            tracing::debug!(parent: &self.span, "operation abandoned");
        }
    }
}

/// Annotate a state-machine transition on the given span.
pub fn record_stage(span: &Span, stage: &'static str) {
    span.record(attrs::STAGE, stage);
    tracing::debug!(parent: span, stage, "stage transition");
}

fn mark_error(span: &Span, description: &str) {
    // Code first: a later status_code would reset the description.
    span.record(attrs::STATUS_CODE, "ERROR");
    span.record(attrs::STATUS_MESSAGE, description);
}
