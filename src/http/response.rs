//! Client-facing error responses.
//!
//! # Responsibilities
//! - Map handler failures to HTTP status codes
//! - Render the fixed `{"message": ..}` body
//!
//! # Design Decisions
//! - Messages are a closed set; provider detail never reaches the client
//! - Handlers record the underlying error on their span before converting

use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiError {
    /// Request body is not the expected JSON object.
    MalformedRequest,
    InvalidZipcode,
    ZipcodeNotFound,
    /// Weather provider failed (orchestrator only).
    WeatherUnavailable,
    /// Any orchestrator answer the input service cannot relay.
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MalformedRequest => StatusCode::BAD_REQUEST,
            ApiError::InvalidZipcode => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::ZipcodeNotFound => StatusCode::NOT_FOUND,
            ApiError::WeatherUnavailable | ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ApiError::MalformedRequest => "invalid request body",
            ApiError::InvalidZipcode => "invalid zipcode",
            ApiError::ZipcodeNotFound => "can not find zipcode",
            ApiError::WeatherUnavailable => "weather service unavailable",
            ApiError::Internal => "internal server error",
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for ApiError {}

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            message: self.message().to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
