//! Error types for the HTTP boundary.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use hiv_core::SimError;
use thiserror::Error;

/// Errors raised while starting or configuring the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Bind address is not an IP address
    #[error("Invalid host: {0}")]
    InvalidHost(String),

    /// A configured CORS origin is not a valid header value
    #[error("Invalid CORS origin: {0}")]
    InvalidOrigin(String),

    /// Socket setup or serving failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors returned to HTTP clients.
///
/// Every variant renders as `{ "error": <message> }`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Parameter validation or simulation failure
    #[error(transparent)]
    Simulation(#[from] SimError),

    /// Body was not valid JSON for the request schema
    #[error("{}", .0.body_text())]
    InvalidBody(#[from] JsonRejection),

    /// Query string did not match the expected shape
    #[error("{}", .0.body_text())]
    InvalidQuery(#[from] QueryRejection),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Simulation(e) if e.is_invalid_input() => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Simulation(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InvalidBody(rejection) => rejection.status(),
            ApiError::InvalidQuery(rejection) => rejection.status(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %self, "request rejected");
        }
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
