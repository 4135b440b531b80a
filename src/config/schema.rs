//! Configuration schema definitions.
//!
//! Both services share one schema; [`ServiceRole`] decides the defaults that
//! differ between them. All types derive Serde traits so a TOML file may set
//! any subset of keys.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which of the two services this process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceRole {
    /// Public entry point: validates the body and forwards to the orchestrator.
    Input,
    /// Resolves a CEP into a temperature report.
    Orchestrator,
}

impl ServiceRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceRole::Input => "input",
            ServiceRole::Orchestrator => "orchestrator",
        }
    }

    fn default_port(&self) -> u16 {
        match self {
            ServiceRole::Input => 8080,
            ServiceRole::Orchestrator => 8082,
        }
    }

    fn default_service_name(&self) -> &'static str {
        match self {
            ServiceRole::Input => "service-a",
            ServiceRole::Orchestrator => "service-b",
        }
    }

    fn default_upstream_secs(&self) -> u64 {
        match self {
            ServiceRole::Input => 30,
            ServiceRole::Orchestrator => 10,
        }
    }

    fn default_request_secs(&self) -> u64 {
        match self {
            ServiceRole::Input => 35,
            ServiceRole::Orchestrator => 25,
        }
    }

    /// Sequential upstream calls made while serving one request.
    pub fn upstream_calls(&self) -> u64 {
        match self {
            ServiceRole::Input => 1,
            ServiceRole::Orchestrator => 2,
        }
    }
}

impl fmt::Display for ServiceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Root configuration for either service.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upstream endpoints and credentials.
    pub upstreams: UpstreamConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Logging and trace export.
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Defaults for the given role before any file or environment override.
    pub fn for_role(role: ServiceRole) -> Self {
        Self {
            listener: ListenerConfig {
                bind_address: format!("0.0.0.0:{}", role.default_port()),
            },
            timeouts: TimeoutConfig {
                request_secs: role.default_request_secs(),
                upstream_secs: role.default_upstream_secs(),
            },
            observability: ObservabilityConfig {
                service_name: role.default_service_name().to_string(),
                ..ObservabilityConfig::default()
            },
            ..Self::default()
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upstream services.
#[derive(Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the orchestrator (used by the input service).
    pub orchestrator_url: String,

    /// Base URL of the postal code registry.
    pub postal_base_url: String,

    /// Base URL of the weather provider.
    pub weather_base_url: String,

    /// Weather provider API key.
    pub weather_api_key: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            orchestrator_url: "http://localhost:8082".to_string(),
            postal_base_url: "https://viacep.com.br".to_string(),
            weather_base_url: "http://api.weatherapi.com".to_string(),
            weather_api_key: String::new(),
        }
    }
}

impl fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("orchestrator_url", &self.orchestrator_url)
            .field("postal_base_url", &self.postal_base_url)
            .field("weather_base_url", &self.weather_base_url)
            .field(
                "weather_api_key",
                &if self.weather_api_key.is_empty() { "" } else { "<redacted>" },
            )
            .finish()
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total time allowed for serving one inbound request, in seconds.
    ///
    /// Must leave room for every upstream call the role makes.
    pub request_secs: u64,

    /// Per-call timeout for upstream HTTP requests, in seconds.
    pub upstream_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 25,
            upstream_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 64 * 1024,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Reported as the `service.name` resource attribute.
    pub service_name: String,

    /// Log filter directive, used when `RUST_LOG` is unset.
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub json_logs: bool,

    /// Export spans over OTLP.
    pub traces_enabled: bool,

    /// OTLP/gRPC collector endpoint.
    pub otlp_endpoint: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: "service-b".to_string(),
            log_level: "info,tower_http=debug".to_string(),
            json_logs: false,
            traces_enabled: true,
            otlp_endpoint: "http://localhost:4317".to_string(),
        }
    }
}
