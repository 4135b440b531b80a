//! Client for the orchestrator service, used by the input service.
//!
//! The `call_service_b` span is the parent the orchestrator continues from:
//! its context is injected as `traceparent` on the outbound request.

use async_trait::async_trait;
use axum::body::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::field::Empty;
use tracing::{Instrument, Span};
use url::Url;

use super::{join_url, TemperatureService};
use crate::domain::{Cep, TemperatureReport};
use crate::observability::propagation;
use crate::observability::span::{attrs, names, SpanScope};

/// Value of the `service` span attribute.
pub const SERVICE_NAME: &str = "service-b";

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("orchestrator rejected the zipcode")]
    InvalidZipcode,

    #[error("orchestrator could not find the zipcode")]
    NotFound,

    #[error("orchestrator returned unexpected status {0}")]
    UnexpectedStatus(u16),

    #[error("orchestrator request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("orchestrator returned an unreadable report: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A successful orchestrator answer: the decoded report plus the exact bytes
/// received, which are relayed to the client unchanged.
#[derive(Debug, Clone)]
pub struct RelayedReport {
    pub report: TemperatureReport,
    pub body: Bytes,
}

#[derive(Debug, Clone)]
pub struct OrchestratorClient {
    http: Client,
    base_url: Url,
}

impl OrchestratorClient {
    pub fn new(http: Client, base_url: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            http,
            base_url: Url::parse(base_url)?,
        })
    }

    async fn fetch(&self, cep: &Cep) -> Result<RelayedReport, OrchestratorError> {
        let span = Span::current();

        let mut headers = HeaderMap::new();
        propagation::inject_context(&span, &mut headers);

        let response = self
            .http
            .get(join_url(&self.base_url, &format!("/{cep}")))
            .headers(headers)
            .send()
            .await?;

        let status = response.status();
        span.record(attrs::HTTP_STATUS_CODE, i64::from(status.as_u16()));

        match status {
            StatusCode::OK => {
                let body = response.bytes().await?;
                let report = serde_json::from_slice(&body)?;
                Ok(RelayedReport { report, body })
            }
            StatusCode::UNPROCESSABLE_ENTITY => Err(OrchestratorError::InvalidZipcode),
            StatusCode::NOT_FOUND => Err(OrchestratorError::NotFound),
            other => Err(OrchestratorError::UnexpectedStatus(other.as_u16())),
        }
    }
}

#[async_trait]
impl TemperatureService for OrchestratorClient {
    async fn temperature(&self, cep: &Cep) -> Result<RelayedReport, OrchestratorError> {
        let scope = SpanScope::open(tracing::info_span!(
            names::CALL_ORCHESTRATOR,
            otel.kind = "client",
            service = SERVICE_NAME,
            cep = %cep,
            http.status_code = Empty,
            otel.status_code = Empty,
            otel.status_message = Empty,
        ));

        let result = self.fetch(cep).instrument(scope.span().clone()).await;
        scope.close(result)
    }
}
