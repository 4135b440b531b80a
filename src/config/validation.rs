//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, body limit > 0)
//! - Check that the request timeout outlasts the role's upstream calls
//! - Check that every upstream is an absolute http(s) URL
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::{AppConfig, ServiceRole};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address {0:?} is not an ip:port socket address")]
    BindAddress(String),

    #[error("{field} {value:?} is not an absolute http(s) URL")]
    Url { field: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("observability.service_name must not be empty")]
    EmptyServiceName,

    #[error(
        "timeouts.request_secs ({request_secs}) must exceed {calls} x timeouts.upstream_secs ({upstream_secs})"
    )]
    RequestBudget {
        request_secs: u64,
        upstream_secs: u64,
        calls: u64,
    },
}

pub fn validate_config(
    config: &AppConfig,
    role: ServiceRole,
) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    let mut urls = vec![
        ("upstreams.orchestrator_url", &config.upstreams.orchestrator_url),
        ("upstreams.postal_base_url", &config.upstreams.postal_base_url),
        ("upstreams.weather_base_url", &config.upstreams.weather_base_url),
    ];
    if config.observability.traces_enabled {
        urls.push(("observability.otlp_endpoint", &config.observability.otlp_endpoint));
    }
    for (field, value) in urls {
        if !is_http_url(value) {
            errors.push(ValidationError::Url {
                field,
                value: value.clone(),
            });
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.request_secs"));
    }
    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.upstream_secs"));
    }
    let timeouts = &config.timeouts;
    let calls = role.upstream_calls();
    if timeouts.request_secs > 0
        && timeouts.upstream_secs > 0
        && timeouts.request_secs <= timeouts.upstream_secs.saturating_mul(calls)
    {
        errors.push(ValidationError::RequestBudget {
            request_secs: timeouts.request_secs,
            upstream_secs: timeouts.upstream_secs,
            calls,
        });
    }
    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::Zero("limits.max_body_bytes"));
    }

    if config.observability.service_name.trim().is_empty() {
        errors.push(ValidationError::EmptyServiceName);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_http_url(value: &str) -> bool {
    match Url::parse(value) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.has_host(),
        Err(_) => false,
    }
}
