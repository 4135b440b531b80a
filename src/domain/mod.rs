//! Domain types shared by both services.
//!
//! # Data Flow
//! ```text
//! raw input ("01310-100")
//!     → cep.rs (strip, validate → Cep)
//!     → postal lookup → PostalCodeRecord (model.rs)
//!     → weather lookup → WeatherSample (model.rs)
//!     → temperature.rs (C → F/K) → TemperatureReport
//! ```
//!
//! Everything here is pure: no I/O, no tracing.

pub mod cep;
pub mod model;
pub mod temperature;

pub use cep::{is_valid_format, Cep, InvalidCep};
pub use model::{PostalCodeRecord, WeatherSample};
pub use temperature::{to_fahrenheit, to_kelvin, TemperatureReport};
