//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, request-level log span)
//!     → input.rs | orchestrator.rs (handler span, stage machine, upstream calls)
//!     → response.rs (typed error → status + {"message": ..})
//!     → Send to client
//! ```

pub mod health;
pub mod input;
pub mod orchestrator;
pub mod request;
pub mod response;
pub mod server;

pub use request::{UuidRequestId, X_REQUEST_ID};
pub use response::{ApiError, ErrorBody};
pub use server::{HttpServer, BuildError};
