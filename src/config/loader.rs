//! Configuration loading from defaults, disk and the environment.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::{AppConfig, ServiceRole};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to render default config: {0}")]
    Defaults(#[from] toml::ser::Error),

    #[error("invalid value {value:?} for environment variable {key}")]
    InvalidEnv { key: &'static str, value: String },

    #[error("validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load, override and validate the configuration for `role`.
///
/// Without a path the role defaults are used as the base.
pub fn load_config(path: Option<&Path>, role: ServiceRole) -> Result<AppConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            parse_config(&content, role)?
        }
        None => AppConfig::for_role(role),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config, role).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Parse a TOML document on top of the role defaults.
///
/// Keys present in the document replace the default; tables are merged
/// recursively, so a file may set a single nested key.
pub fn parse_config(content: &str, role: ServiceRole) -> Result<AppConfig, ConfigError> {
    let mut base: toml::Table = toml::to_string(&AppConfig::for_role(role))?.parse()?;
    let overlay: toml::Table = content.parse()?;
    merge(&mut base, overlay);

    Ok(toml::Value::Table(base).try_into()?)
}

fn merge(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match value {
            toml::Value::Table(nested) => match base.get_mut(&key) {
                Some(toml::Value::Table(existing)) => merge(existing, nested),
                _ => {
                    base.insert(key, toml::Value::Table(nested));
                }
            },
            value => {
                base.insert(key, value);
            }
        }
    }
}

/// Apply environment overrides using `lookup` to read variables.
///
/// Empty values are treated as unset.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |key: &str| {
        lookup(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };

    if let Some(value) = var("PORT") {
        let port: u16 = value.parse().map_err(|_| ConfigError::InvalidEnv {
            key: "PORT",
            value: value.clone(),
        })?;
        let host = config
            .listener
            .bind_address
            .rsplit_once(':')
            .map(|(host, _)| host)
            .unwrap_or("0.0.0.0");
        config.listener.bind_address = format!("{host}:{port}");
    }

    if let Some(value) = var("SERVICE_B_URL") {
        config.upstreams.orchestrator_url = value;
    }
    if let Some(value) = var("VIACEP_BASE_URL") {
        config.upstreams.postal_base_url = value;
    }
    if let Some(value) = var("WEATHER_API_BASE_URL") {
        config.upstreams.weather_base_url = value;
    }
    if let Some(value) = var("WEATHER_API_KEY") {
        config.upstreams.weather_api_key = value;
    }

    if let Some(value) = var("REQUEST_TIMEOUT_SECS") {
        config.timeouts.request_secs = value.parse().map_err(|_| ConfigError::InvalidEnv {
            key: "REQUEST_TIMEOUT_SECS",
            value: value.clone(),
        })?;
    }
    if let Some(value) = var("UPSTREAM_TIMEOUT_SECS") {
        config.timeouts.upstream_secs = value.parse().map_err(|_| ConfigError::InvalidEnv {
            key: "UPSTREAM_TIMEOUT_SECS",
            value: value.clone(),
        })?;
    }

    if let Some(value) = var("OTEL_EXPORTER_OTLP_ENDPOINT") {
        config.observability.otlp_endpoint = with_scheme(&value);
    }
    if let Some(value) = var("OTEL_SERVICE_NAME") {
        config.observability.service_name = value;
    }
    if let Some(value) = var("OTEL_SDK_DISABLED") {
        config.observability.traces_enabled = !value.eq_ignore_ascii_case("true");
    }
    if let Some(value) = var("LOG_LEVEL") {
        config.observability.log_level = value;
    }
    if let Some(value) = var("LOG_FORMAT") {
        config.observability.json_logs = value.eq_ignore_ascii_case("json");
    }

    Ok(())
}

/// Collector endpoints are commonly given as `host:port`.
fn with_scheme(endpoint: &str) -> String {
    if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        format!("http://{endpoint}")
    }
}
