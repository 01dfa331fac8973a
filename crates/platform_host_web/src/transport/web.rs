//! Web transport: JSON requests over HTTP, subscriptions over WebSockets.

use platform_host::{
    channels::{api_endpoint, socket_endpoint, DEFAULT_API_BASE},
    ChannelListener, HostError, HostResult, Subscription, TransportFuture, TransportService,
};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, error};

#[cfg(target_arch = "wasm32")]
use crate::bridge::post_keepalive;
use crate::bridge::{open_socket, spawn_detached};

/// HTTP/WebSocket transport targeting the web backing service.
///
/// Requests are `POST <origin><api base>/<channel>` with a JSON body. Subscriptions open one
/// WebSocket per call at `ws(s)://<host>/ws/<channel>`.
#[derive(Debug, Clone)]
pub struct WebTransport {
    client: Client,
    origin: String,
    api_base: String,
}

impl WebTransport {
    /// Creates a transport for the service at `origin` (scheme, host and port).
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            origin: origin.into().trim_end_matches('/').to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Overrides the request path prefix, or the full request base URL.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Service origin.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Absolute request URL for a channel.
    pub fn endpoint(&self, channel: &str) -> String {
        if self.api_base.contains("://") {
            api_endpoint(&self.api_base, channel)
        } else {
            format!("{}{}", self.origin, api_endpoint(&self.api_base, channel))
        }
    }
}

/// Failure message for a non-success response: `message`, then `error`, then the status reason.
fn failure_message(status: StatusCode, body: &Value) -> String {
    ["message", "error"]
        .iter()
        .find_map(|field| body.get(field).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| {
            format!(
                "API error: {}",
                status.canonical_reason().unwrap_or(status.as_str())
            )
        })
}

async fn post_json(client: &Client, url: &str, payload: &Value) -> HostResult<Value> {
    let request = client.post(url).json(payload);
    #[cfg(target_arch = "wasm32")]
    let request = request.fetch_credentials_include();

    let response = request
        .send()
        .await
        .map_err(|err| HostError::transport(format!("request to {url} failed: {err}")))?;
    let status = response.status();
    if !status.is_success() {
        let body = response.json::<Value>().await.unwrap_or(Value::Null);
        return Err(HostError::transport(failure_message(status, &body)));
    }

    response
        .json::<Value>()
        .await
        .map_err(|err| HostError::transport(format!("invalid response from {url}: {err}")))
}

/// Request issued by `send`. Browsers use a keepalive fetch so it survives page unload.
#[cfg(target_arch = "wasm32")]
async fn post_detached(_client: &Client, url: &str, payload: &Value) -> HostResult<()> {
    let (status, body) = post_keepalive(url, payload).await?;
    match StatusCode::from_u16(status) {
        Ok(status) if status.is_success() => Ok(()),
        Ok(status) => Err(HostError::transport(failure_message(status, &body))),
        Err(_) => Err(HostError::transport(format!(
            "invalid status {status} from {url}"
        ))),
    }
}

#[cfg(not(target_arch = "wasm32"))]
async fn post_detached(client: &Client, url: &str, payload: &Value) -> HostResult<()> {
    post_json(client, url, payload).await.map(drop)
}

impl TransportService for WebTransport {
    fn invoke<'a>(
        &'a self,
        channel: &'a str,
        payload: Value,
    ) -> TransportFuture<'a, HostResult<Value>> {
        Box::pin(async move {
            let url = self.endpoint(channel);
            let result = post_json(&self.client, &url, &payload).await;
            if let Err(err) = &result {
                debug!(channel = %channel, error = %err, "IPC invoke failed");
            }
            result
        })
    }

    fn send(&self, channel: &str, payload: Value) {
        let client = self.client.clone();
        let url = self.endpoint(channel);
        let channel = channel.to_string();
        spawn_detached("transport-send", async move {
            if let Err(err) = post_detached(&client, &url, &payload).await {
                error!(channel = %channel, error = %err, "IPC send failed");
            }
        });
    }

    fn on(&self, channel: &str, listener: ChannelListener) -> Subscription {
        open_socket(
            socket_endpoint(&self.origin, channel),
            channel.to_string(),
            listener,
        )
    }
}
