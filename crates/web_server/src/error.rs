//! HTTP error responses.

use axum::{
    extract::rejection::BytesRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use platform_host::HostError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Failure of an API request, rendered as HTTP 500 `{"error": <message>}`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request body could not be read, e.g. it exceeds the size limit.
    #[error("{0}")]
    UnreadableBody(String),
    /// The request body is not JSON.
    #[error("invalid JSON body: {0}")]
    InvalidBody(#[from] serde_json::Error),
    /// The dispatched handler failed.
    #[error(transparent)]
    Host(#[from] HostError),
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        Self::UnreadableBody(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        let message = self.to_string();
        error!(status = status.as_u16(), error = %message, "request failed");
        (status, Json(json!({ "error": message }))).into_response()
    }
}
