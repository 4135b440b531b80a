//! CEP weather services library.
//!
//! Two cooperating HTTP services resolve a Brazilian postal code (CEP) into
//! the current temperature of its city:
//!
//! - **input**: accepts `POST / {"cep": ..}`, validates, forwards
//! - **orchestrator**: `GET /{cep}` → postal registry → weather provider
//!
//! Both export one distributed trace per request over OTLP.

// Core
pub mod domain;
pub mod clients;
pub mod http;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::{AppConfig, ServiceRole};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
