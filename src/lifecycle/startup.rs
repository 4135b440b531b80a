//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Initialize telemetry before anything logs
//! - Build the server for the requested role and bind its listener
//! - Serve until a termination signal, then flush telemetry
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listeners start last (traffic only when ready)

use std::path::Path;

use thiserror::Error;
use tokio::net::TcpListener;

use super::{signals, Shutdown};
use crate::config::{load_config, AppConfig, ConfigError, ServiceRole};
use crate::http::{BuildError, HttpServer};
use crate::observability::{init_telemetry, TelemetryError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Telemetry(#[from] TelemetryError),

    #[error(transparent)]
    Server(#[from] BuildError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Run one service role to completion.
pub async fn run(role: ServiceRole, config_path: Option<&Path>) -> Result<(), StartupError> {
    // 1. Configuration
    let config = load_config(config_path, role)?;

    // 2. Telemetry; the guard flushes pending spans when this function returns
    let telemetry = init_telemetry(&config.observability)?;
    log_startup(role, &config, telemetry.traces_enabled());

    // 3. Server
    let server = HttpServer::for_role(role, config)?;
    let address = server.config().listener.bind_address.clone();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address, source })?;

    // 4. Serve until signalled
    let shutdown = Shutdown::new();
    let signal_task = signals::spawn_signal_handler(shutdown.clone());
    let result = server.run(listener, shutdown.subscribe()).await;
    signal_task.abort();

    tracing::info!(role = %role, "Shutdown complete");
    drop(telemetry);

    result.map_err(StartupError::Serve)
}

fn log_startup(role: ServiceRole, config: &AppConfig, traces_enabled: bool) {
    tracing::info!(
        role = %role,
        service = %config.observability.service_name,
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        traces_enabled,
        otlp_endpoint = %config.observability.otlp_endpoint,
        "Starting service"
    );

    match role {
        ServiceRole::Input => {
            tracing::info!(
                orchestrator_url = %config.upstreams.orchestrator_url,
                upstream_timeout_secs = config.timeouts.upstream_secs,
                "Endpoints: POST / {{\"cep\": \"<8 digits>\"}}, GET /health"
            );
        }
        ServiceRole::Orchestrator => {
            tracing::info!(
                postal_base_url = %config.upstreams.postal_base_url,
                weather_base_url = %config.upstreams.weather_base_url,
                upstream_timeout_secs = config.timeouts.upstream_secs,
                "Endpoints: GET /{{cep}}, GET /health"
            );
            if config.upstreams.weather_api_key.is_empty() {
                tracing::warn!("WEATHER_API_KEY is not set; weather lookups will be rejected upstream");
            }
        }
    }
}
