//! Input handler: validates the request body and forwards to the orchestrator.
//!
//! # Data Flow
//! ```text
//! POST / {"cep": "..."}
//!     → ReceivedRequest → (decode body) ──malformed──► Rejected → 400
//!     → Validating ──invalid──► Rejected → 422 (no network call)
//!     → CallingOrchestration ──► call_service_b span, traceparent injected
//!         200 → relay body unchanged
//!         422 → 422, 404 → 404, anything else → 500
//!     → Done
//! ```

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use thiserror::Error;
use tracing::field::Empty;
use tracing::{Instrument, Span};

use super::health;
use super::response::ApiError;
use crate::clients::{OrchestratorError, RelayedReport, TemperatureService};
use crate::domain::{Cep, InvalidCep};
use crate::observability::span::{attrs, names, record_stage, SpanScope};

#[derive(Debug, Clone)]
pub struct InputState {
    orchestrator: Arc<dyn TemperatureService>,
}

impl InputState {
    pub fn new(orchestrator: Arc<dyn TemperatureService>) -> Self {
        Self { orchestrator }
    }
}

pub fn routes(state: InputState) -> Router {
    Router::new()
        .route("/", post(cep_handler).get(health::input_info))
        .route("/health", get(health::health))
        .with_state(state)
}

/// Request body. A missing `cep` decodes as empty and fails validation.
#[derive(Debug, Deserialize)]
struct CepRequest {
    #[serde(default)]
    cep: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    ReceivedRequest,
    Validating,
    CallingOrchestration,
    Done,
    Rejected,
    Failed,
}

impl Stage {
    fn as_str(self) -> &'static str {
        match self {
            Stage::ReceivedRequest => "received_request",
            Stage::Validating => "validating",
            Stage::CallingOrchestration => "calling_orchestration",
            Stage::Done => "done",
            Stage::Rejected => "rejected",
            Stage::Failed => "failed",
        }
    }
}

#[derive(Debug, Error)]
enum InputFailure {
    #[error("malformed request body: {0}")]
    MalformedBody(#[source] serde_json::Error),

    #[error(transparent)]
    InvalidZipcode(#[from] InvalidCep),

    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),
}

impl InputFailure {
    fn stage(&self) -> Stage {
        match self {
            InputFailure::MalformedBody(_) | InputFailure::InvalidZipcode(_) => Stage::Rejected,
            InputFailure::Orchestrator(_) => Stage::Failed,
        }
    }
}

impl From<&InputFailure> for ApiError {
    fn from(failure: &InputFailure) -> Self {
        match failure {
            InputFailure::MalformedBody(_) => ApiError::MalformedRequest,
            InputFailure::InvalidZipcode(_) => ApiError::InvalidZipcode,
            InputFailure::Orchestrator(e) => ApiError::from(e),
        }
    }
}

impl From<&OrchestratorError> for ApiError {
    fn from(error: &OrchestratorError) -> Self {
        match error {
            OrchestratorError::InvalidZipcode => ApiError::InvalidZipcode,
            OrchestratorError::NotFound => ApiError::ZipcodeNotFound,
            OrchestratorError::UnexpectedStatus(_)
            | OrchestratorError::Request(_)
            | OrchestratorError::Decode(_) => ApiError::Internal,
        }
    }
}

/// `POST /`.
pub async fn cep_handler(State(state): State<InputState>, body: Bytes) -> Response {
    let scope = SpanScope::open(tracing::info_span!(
        names::CEP_HANDLER,
        otel.kind = "server",
        cep = Empty,
        validation = Empty,
        error = Empty,
        stage = Empty,
        city = Empty,
        temp_c = Empty,
        otel.status_code = Empty,
        otel.status_message = Empty,
    ));
    record_stage(scope.span(), Stage::ReceivedRequest.as_str());

    let result = forward(&state, &body).instrument(scope.span().clone()).await;

    let stage = match &result {
        Ok(_) => Stage::Done,
        Err(failure) => failure.stage(),
    };
    record_stage(scope.span(), stage.as_str());

    match scope.close(result) {
        Ok(relayed) => (
            [(header::CONTENT_TYPE, "application/json")],
            relayed.body,
        )
            .into_response(),
        Err(failure) => ApiError::from(&failure).into_response(),
    }
}

async fn forward(state: &InputState, body: &[u8]) -> Result<RelayedReport, InputFailure> {
    let span = Span::current();

    // 1. Decode
    let request: CepRequest = serde_json::from_slice(body).map_err(|e| {
        span.record(attrs::ERROR, "invalid_json");
        InputFailure::MalformedBody(e)
    })?;
    span.record(attrs::CEP, request.cep.as_str());

    // 2. Validate locally before any network call
    record_stage(&span, Stage::Validating.as_str());
    let cep = Cep::parse(&request.cep).inspect_err(|_| {
        span.record(attrs::VALIDATION, "invalid_zipcode");
    })?;

    // 3. Forward the normalized CEP
    record_stage(&span, Stage::CallingOrchestration.as_str());
    let relayed = state.orchestrator.temperature(&cep).await?;
    span.record(attrs::CITY, relayed.report.city.as_str());
    span.record(attrs::TEMP_C, relayed.report.temp_c);

    tracing::info!(
        cep = %cep,
        city = %relayed.report.city,
        temp_c = relayed.report.temp_c,
        "temperature relayed"
    );

    Ok(relayed)
}
