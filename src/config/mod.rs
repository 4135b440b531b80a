//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! role defaults (schema.rs)
//!     → optional TOML file, merged key by key (loader.rs)
//!     → environment overrides (loader.rs)
//!     → validation.rs (semantic checks, all errors collected)
//!     → AppConfig (validated, immutable)
//!     → handed by value to the server and telemetry bootstrap
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults so an empty file (or no file) is valid
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{apply_env_overrides, load_config, parse_config, ConfigError};
pub use schema::{
    AppConfig, LimitsConfig, ListenerConfig, ObservabilityConfig, ServiceRole, TimeoutConfig,
    UpstreamConfig,
};
pub use validation::{validate_config, ValidationError};
