//! HTTP route handlers.

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, Path},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};

use crate::{dispatch::handle_ipc_method, error::ApiError};

/// `GET /health`.
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}

/// `POST /api/:method`. An empty body is treated as JSON `null`.
pub async fn ipc_method(
    Path(method): Path<String>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<Value>, ApiError> {
    let body = body?;
    let data = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_json::from_slice(&body)?
    };
    Ok(Json(handle_ipc_method(&method, &data)?))
}
