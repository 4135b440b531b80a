//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! handlers / clients
//!     → span.rs (named spans, SpanScope guard, error + stage annotation)
//!     → propagation.rs (traceparent inject on the way out, extract on the way in)
//!
//! subscriber (telemetry.rs + logging.rs):
//!     registry
//!       ├─ OpenTelemetry layer (crate spans, INFO+) → batch processor → OTLP/gRPC
//!       └─ fmt layer (EnvFilter) → stdout, plain or JSON
//! ```
//!
//! # Design Decisions
//! - `tracing` is the only instrumentation API used by the rest of the crate
//! - W3C Trace Context is the only propagation format
//! - No global propagator or tracer is installed; handlers call propagation.rs directly

pub mod logging;
pub mod propagation;
pub mod span;
pub mod telemetry;

pub use propagation::{continue_trace, inject_context};
pub use span::SpanScope;
pub use telemetry::{init_telemetry, trace_layer, TelemetryError, TelemetryGuard};
