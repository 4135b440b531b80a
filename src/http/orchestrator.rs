//! Orchestrator handler: CEP → postal lookup → weather lookup → report.
//!
//! # Data Flow
//! ```text
//! GET /{cep}  (traceparent from the input service, if any)
//!     → ReceivedRequest → Validating ──invalid──► Rejected → 422
//!     → LookingUpPostalCode ──any failure──► Failed → 404
//!     → LookingUpWeather ──any failure──► Failed → 500
//!     → BuildingResponse → Done → 200 {"city", "temp_C", "temp_F", "temp_K"}
//! ```
//!
//! The `weather_handler` span is the parent of both lookup spans and carries
//! the current stage as an attribute.

use std::sync::Arc;

use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use thiserror::Error;
use tracing::field::Empty;
use tracing::{Instrument, Span};

use super::health;
use super::response::ApiError;
use crate::clients::{PostalLookup, PostalLookupError, WeatherLookup, WeatherLookupError};
use crate::domain::{Cep, InvalidCep, TemperatureReport};
use crate::observability::propagation;
use crate::observability::span::{attrs, names, record_stage, SpanScope};

/// Lookups injected at startup.
#[derive(Debug, Clone)]
pub struct OrchestratorState {
    postal: Arc<dyn PostalLookup>,
    weather: Arc<dyn WeatherLookup>,
}

impl OrchestratorState {
    pub fn new(postal: Arc<dyn PostalLookup>, weather: Arc<dyn WeatherLookup>) -> Self {
        Self { postal, weather }
    }
}

pub fn routes(state: OrchestratorState) -> Router {
    Router::new()
        .route("/", get(health::orchestrator_info))
        .route("/health", get(health::health))
        .route("/{cep}", get(weather_handler))
        .with_state(state)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    ReceivedRequest,
    Validating,
    LookingUpPostalCode,
    LookingUpWeather,
    BuildingResponse,
    Done,
    Rejected,
    Failed,
}

impl Stage {
    fn as_str(self) -> &'static str {
        match self {
            Stage::ReceivedRequest => "received_request",
            Stage::Validating => "validating",
            Stage::LookingUpPostalCode => "looking_up_postal_code",
            Stage::LookingUpWeather => "looking_up_weather",
            Stage::BuildingResponse => "building_response",
            Stage::Done => "done",
            Stage::Rejected => "rejected",
            Stage::Failed => "failed",
        }
    }
}

#[derive(Debug, Error)]
enum LookupFailure {
    #[error(transparent)]
    InvalidZipcode(#[from] InvalidCep),

    #[error(transparent)]
    Postal(#[from] PostalLookupError),

    #[error(transparent)]
    Weather(#[from] WeatherLookupError),
}

impl LookupFailure {
    fn stage(&self) -> Stage {
        match self {
            LookupFailure::InvalidZipcode(_) => Stage::Rejected,
            LookupFailure::Postal(_) | LookupFailure::Weather(_) => Stage::Failed,
        }
    }
}

impl From<&LookupFailure> for ApiError {
    fn from(failure: &LookupFailure) -> Self {
        match failure {
            LookupFailure::InvalidZipcode(_) => ApiError::InvalidZipcode,
            // Transport failures and registry errors both read as "not found".
            LookupFailure::Postal(_) => ApiError::ZipcodeNotFound,
            LookupFailure::Weather(_) => ApiError::WeatherUnavailable,
        }
    }
}

/// `GET /{cep}`.
pub async fn weather_handler(
    State(state): State<OrchestratorState>,
    path: Result<Path<String>, PathRejection>,
    headers: HeaderMap,
) -> Response {
    // An undecodable path segment cannot be a CEP; it fails validation below.
    let raw = path.map(|Path(raw)| raw).unwrap_or_default();

    let span = tracing::info_span!(
        names::WEATHER_HANDLER,
        otel.kind = "server",
        cep = %raw,
        validation = Empty,
        stage = Empty,
        response.city = Empty,
        response.temp_c = Empty,
        response.temp_f = Empty,
        response.temp_k = Empty,
        otel.status_code = Empty,
        otel.status_message = Empty,
    );
    let remote_parent = propagation::continue_trace(&span, &headers);
    let scope = SpanScope::open(span);
    record_stage(scope.span(), Stage::ReceivedRequest.as_str());
    tracing::debug!(parent: scope.span(), cep = %raw, remote_parent, "weather request received");

    let result = resolve(&state, &raw).instrument(scope.span().clone()).await;

    let stage = match &result {
        Ok(_) => Stage::Done,
        Err(failure) => failure.stage(),
    };
    record_stage(scope.span(), stage.as_str());

    match scope.close(result) {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(failure) => ApiError::from(&failure).into_response(),
    }
}

async fn resolve(state: &OrchestratorState, raw: &str) -> Result<TemperatureReport, LookupFailure> {
    let span = Span::current();

    // 1. Validate
    record_stage(&span, Stage::Validating.as_str());
    let cep = Cep::parse(raw).inspect_err(|_| {
        span.record(attrs::VALIDATION, "invalid_zipcode");
    })?;

    // 2. Resolve locality
    record_stage(&span, Stage::LookingUpPostalCode.as_str());
    let record = state.postal.lookup(&cep).await?;

    // 3. Current conditions for that locality
    record_stage(&span, Stage::LookingUpWeather.as_str());
    let sample = state.weather.current(&record.locality).await?;

    // 4. Build report; the city is the weather provider's location name
    record_stage(&span, Stage::BuildingResponse.as_str());
    let report = TemperatureReport::from_celsius(sample.location, sample.temp_c);
    span.record(attrs::RESPONSE_CITY, report.city.as_str());
    span.record(attrs::RESPONSE_TEMP_C, report.temp_c);
    span.record(attrs::RESPONSE_TEMP_F, report.temp_f);
    span.record(attrs::RESPONSE_TEMP_K, report.temp_k);

    tracing::info!(
        cep = %cep,
        locality = %record.locality,
        city = %report.city,
        temp_c = report.temp_c,
        "temperature resolved"
    );

    Ok(report)
}
