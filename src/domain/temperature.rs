//! Temperature conversion and the client-facing report.

use serde::{Deserialize, Serialize};

/// Offset used for Kelvin. Kept at 273 (not 273.15) for wire compatibility.
pub const KELVIN_OFFSET: f64 = 273.0;

pub fn to_fahrenheit(celsius: f64) -> f64 {
    celsius * 1.8 + 32.0
}

pub fn to_kelvin(celsius: f64) -> f64 {
    celsius + KELVIN_OFFSET
}

/// Successful response body of both services.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureReport {
    pub city: String,
    #[serde(rename = "temp_C")]
    pub temp_c: f64,
    #[serde(rename = "temp_F")]
    pub temp_f: f64,
    #[serde(rename = "temp_K")]
    pub temp_k: f64,
}

impl TemperatureReport {
    pub fn from_celsius(city: impl Into<String>, celsius: f64) -> Self {
        Self {
            city: city.into(),
            temp_c: celsius,
            temp_f: to_fahrenheit(celsius),
            temp_k: to_kelvin(celsius),
        }
    }
}
