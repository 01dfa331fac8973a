//! `/ws/:channel` push endpoint.
//!
//! Frames from clients are logged and dropped; nothing is routed to a handler yet.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, WebSocketUpgrade,
    },
    response::Response,
};
use tracing::{error, info};

/// Upgrades the request and tracks the connection for `channel`.
pub async fn channel_socket(Path(channel): Path<String>, upgrade: WebSocketUpgrade) -> Response {
    upgrade.on_upgrade(move |socket| serve_socket(channel, socket))
}

async fn serve_socket(channel: String, mut socket: WebSocket) {
    info!(channel = %channel, "WebSocket connected");
    while let Some(frame) = socket.recv().await {
        match frame {
            Ok(Message::Text(text)) => {
                info!(channel = %channel, message = %text, "WebSocket message received");
            }
            Ok(Message::Binary(bytes)) => {
                info!(channel = %channel, len = bytes.len(), "WebSocket binary message received");
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(err) => {
                error!(channel = %channel, error = %err, "WebSocket error");
                break;
            }
        }
    }
    info!(channel = %channel, "WebSocket disconnected");
}
