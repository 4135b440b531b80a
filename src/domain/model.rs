//! Records produced by the upstream lookups.

use serde::{Deserialize, Serialize};

/// Address resolved by the postal registry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PostalCodeRecord {
    pub cep: String,
    pub street: String,
    pub complement: String,
    pub neighborhood: String,
    /// City or town. Never empty on a successful lookup.
    pub locality: String,
    /// Two-letter state code (UF).
    pub region: String,
    pub ibge: String,
    pub ddd: String,
}

/// Current conditions as reported by the weather provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSample {
    /// Location name resolved by the weather provider, not the postal locality.
    pub location: String,
    pub region: String,
    pub country: String,
    pub temp_c: f64,
    pub condition: String,
}
