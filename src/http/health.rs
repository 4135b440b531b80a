//! Liveness and service description endpoints.

use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
}

pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus { status: "ok" })
}

/// `GET /` response.
#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub service: &'static str,
    pub version: &'static str,
    pub description: &'static str,
    pub endpoints: Vec<EndpointInfo>,
}

#[derive(Debug, Serialize)]
pub struct EndpointInfo {
    pub method: &'static str,
    pub path: &'static str,
    pub description: &'static str,
}

pub async fn input_info() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: "input",
        version: env!("CARGO_PKG_VERSION"),
        description: "Accepts a CEP and returns the current temperature of its city",
        endpoints: vec![
            EndpointInfo {
                method: "POST",
                path: "/",
                description: r#"body {"cep": "01310100"}"#,
            },
            EndpointInfo {
                method: "GET",
                path: "/health",
                description: "liveness probe",
            },
        ],
    })
}

pub async fn orchestrator_info() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: "orchestrator",
        version: env!("CARGO_PKG_VERSION"),
        description: "Resolves a CEP to its city and reports the temperature in C, F and K",
        endpoints: vec![
            EndpointInfo {
                method: "GET",
                path: "/{cep}",
                description: "temperature report for an 8-digit CEP",
            },
            EndpointInfo {
                method: "GET",
                path: "/health",
                description: "liveness probe",
            },
        ],
    })
}
