//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router for the configured role
//! - Build upstream clients and inject them into handler state
//! - Wire up middleware (request ID, access log, timeout, body limit)
//! - Serve on a listener until the shutdown signal fires
//!
//! # Design Decisions
//! - An expired request timeout answers with the role's own 500 body, so
//!   clients only ever see the fixed error messages
//! - The body limit wraps the timeout; both sit inside the request span

use std::sync::Arc;
use std::time::Duration;

use axum::error_handling::HandleErrorLayer;
use axum::BoxError;
use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::timeout::error::Elapsed;
use tower::timeout::TimeoutLayer;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use super::request::{make_request_span, UuidRequestId};
use super::response::ApiError;
use super::{input, orchestrator};
use crate::clients::{
    build_http_client, OrchestratorClient, PostalLookup, TemperatureService, ViaCepClient,
    WeatherApiClient, WeatherLookup,
};
use crate::config::{AppConfig, ServiceRole};

/// Failure to assemble the server from configuration.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("invalid {field}: {source}")]
    Url {
        field: &'static str,
        source: url::ParseError,
    },
}

/// HTTP server for one service role.
pub struct HttpServer {
    router: Router,
    role: ServiceRole,
    config: AppConfig,
}

impl HttpServer {
    /// Build the server for `role`, constructing the real upstream clients.
    pub fn for_role(role: ServiceRole, config: AppConfig) -> Result<Self, BuildError> {
        let http = build_http_client(Duration::from_secs(config.timeouts.upstream_secs))?;
        let upstreams = &config.upstreams;

        match role {
            ServiceRole::Input => {
                let orchestrator = OrchestratorClient::new(http, &upstreams.orchestrator_url)
                    .map_err(|source| BuildError::Url {
                        field: "upstreams.orchestrator_url",
                        source,
                    })?;
                Ok(Self::input(config, Arc::new(orchestrator)))
            }
            ServiceRole::Orchestrator => {
                let postal = ViaCepClient::new(http.clone(), &upstreams.postal_base_url)
                    .map_err(|source| BuildError::Url {
                        field: "upstreams.postal_base_url",
                        source,
                    })?;
                let weather = WeatherApiClient::new(
                    http,
                    &upstreams.weather_base_url,
                    upstreams.weather_api_key.clone(),
                )
                .map_err(|source| BuildError::Url {
                    field: "upstreams.weather_base_url",
                    source,
                })?;
                Ok(Self::orchestrator(config, Arc::new(postal), Arc::new(weather)))
            }
        }
    }

    /// Input service with an explicit orchestrator implementation.
    pub fn input(config: AppConfig, orchestrator: Arc<dyn TemperatureService>) -> Self {
        let routes = input::routes(input::InputState::new(orchestrator));
        Self {
            router: Self::with_middleware(routes, ServiceRole::Input, &config),
            role: ServiceRole::Input,
            config,
        }
    }

    /// Orchestrator service with explicit lookup implementations.
    pub fn orchestrator(
        config: AppConfig,
        postal: Arc<dyn PostalLookup>,
        weather: Arc<dyn WeatherLookup>,
    ) -> Self {
        let routes = orchestrator::routes(orchestrator::OrchestratorState::new(postal, weather));
        Self {
            router: Self::with_middleware(routes, ServiceRole::Orchestrator, &config),
            role: ServiceRole::Orchestrator,
            config,
        }
    }

    /// Apply the shared middleware stack, outermost first.
    fn with_middleware(routes: Router, role: ServiceRole, config: &AppConfig) -> Router {
        routes.layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
                .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(RequestBodyLimitLayer::new(config.limits.max_body_bytes))
                .layer(HandleErrorLayer::new(move |err: BoxError| async move {
                    handle_middleware_error(role, err)
                }))
                .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
        )
    }

    /// The fully layered router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn role(&self) -> ServiceRole {
        self.role
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run the server until `shutdown` fires or its sender is dropped.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            role = %self.role,
            service = %self.config.observability.service_name,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                // Err means the coordinator is gone, which also ends the server.
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Answer an elapsed request with the role's 500 body. The dropped handler
/// has already closed its spans as cancelled.
fn handle_middleware_error(role: ServiceRole, err: BoxError) -> ApiError {
    if err.is::<Elapsed>() {
        tracing::warn!(role = %role, "request timed out");
    } else {
        tracing::error!(role = %role, error = %err, "middleware failure");
    }

    match role {
        ServiceRole::Input => ApiError::Internal,
        ServiceRole::Orchestrator => ApiError::WeatherUnavailable,
    }
}
