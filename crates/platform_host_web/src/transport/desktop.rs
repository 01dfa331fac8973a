//! Desktop transport over the injected IPC channel.

use platform_host::{
    ChannelListener, HostResult, Subscription, TransportFuture, TransportService,
};
use serde_json::Value;
use tracing::warn;

use crate::bridge::{DesktopBridge, BRIDGE_UNAVAILABLE};

#[derive(Debug, Clone, Default)]
/// Request, message, and subscription routing over the desktop IPC bridge.
///
/// Without a bridge, `invoke` fails while `send` and `on` only log a warning.
pub struct DesktopTransport {
    bridge: DesktopBridge,
}

impl DesktopTransport {
    /// Creates a transport over the given bridge.
    pub fn new(bridge: DesktopBridge) -> Self {
        Self { bridge }
    }
}

impl TransportService for DesktopTransport {
    fn invoke<'a>(
        &'a self,
        channel: &'a str,
        payload: Value,
    ) -> TransportFuture<'a, HostResult<Value>> {
        Box::pin(self.bridge.invoke(channel, payload))
    }

    fn send(&self, channel: &str, payload: Value) {
        match self.bridge.get() {
            Some(bridge) => bridge.send(channel, payload),
            None => warn!(channel = %channel, "{BRIDGE_UNAVAILABLE}"),
        }
    }

    fn on(&self, channel: &str, listener: ChannelListener) -> Subscription {
        match self.bridge.get() {
            Some(bridge) => bridge.subscribe(channel, listener),
            None => {
                warn!(channel = %channel, "{BRIDGE_UNAVAILABLE}");
                Subscription::inert()
            }
        }
    }
}
