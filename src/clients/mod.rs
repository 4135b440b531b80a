//! Upstream HTTP clients.
//!
//! # Data Flow
//! ```text
//! input handler
//!     → TemperatureService  → OrchestratorClient → GET {orchestrator}/{cep}
//!
//! orchestrator handler
//!     → PostalLookup        → ViaCepClient       → GET {registry}/ws/{cep}/json/
//!     → WeatherLookup       → WeatherApiClient   → GET {weather}/v1/current.json
//! ```
//!
//! # Design Decisions
//! - Handlers depend on the traits, never on the concrete clients
//! - Every call opens its own client span as a child of the handler span
//! - One `reqwest::Client` per process, shared by all clients of that process
//! - No retries; the per-call timeout lives on the shared client

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{Cep, PostalCodeRecord, WeatherSample};

pub mod orchestrator;
pub mod viacep;
pub mod weatherapi;

pub use orchestrator::{OrchestratorClient, OrchestratorError, RelayedReport};
pub use viacep::{PostalLookupError, ViaCepClient};
pub use weatherapi::{WeatherApiClient, WeatherLookupError};

/// Resolves a CEP into an address.
#[async_trait]
pub trait PostalLookup: Send + Sync + Debug {
    async fn lookup(&self, cep: &Cep) -> Result<PostalCodeRecord, PostalLookupError>;
}

/// Current conditions for a locality name.
#[async_trait]
pub trait WeatherLookup: Send + Sync + Debug {
    async fn current(&self, locality: &str) -> Result<WeatherSample, WeatherLookupError>;
}

/// The orchestrator as seen from the input service.
#[async_trait]
pub trait TemperatureService: Send + Sync + Debug {
    async fn temperature(&self, cep: &Cep) -> Result<RelayedReport, OrchestratorError>;
}

/// Build the shared HTTP client with a per-request timeout.
pub fn build_http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("cep-weather/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// `base` without trailing slash, joined with `path`.
fn join_url(base: &url::Url, path: &str) -> String {
    format!("{}{}", base.as_str().trim_end_matches('/'), path)
}
