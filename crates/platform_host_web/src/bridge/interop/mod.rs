//! Target-specific runtime glue shared by the bridge and the web transport.
//!
//! Calls are routed to `non_wasm` for native builds and `wasm` for browser builds while keeping
//! a uniform API for callers. Native builds have no IndexedDB, so the `idb_*` calls fail there
//! as unsupported.

use platform_host::{ChannelEvent, ChannelListener};
use serde_json::Value;
use tracing::error;

#[cfg(not(target_arch = "wasm32"))]
mod non_wasm;
#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(not(target_arch = "wasm32"))]
use non_wasm as imp;
#[cfg(target_arch = "wasm32")]
use wasm as imp;

pub(crate) use imp::{
    idb_add, idb_close, idb_delete, idb_get_all, idb_open, idb_put, open_socket, spawn_detached,
};
#[cfg(target_arch = "wasm32")]
pub(crate) use imp::post_keepalive;
#[cfg(target_arch = "wasm32")]
pub use imp::{BrowserFileAccessPicker, BrowserFileInput};

/// Takes a fresh snapshot of the current runtime's capabilities.
pub fn snapshot_runtime() -> platform_host::RuntimeSnapshot {
    imp::snapshot_runtime()
}

/// Origin of the page hosting the UI, when running in a browser.
pub fn page_origin() -> Option<String> {
    imp::page_origin()
}

/// Decodes one text frame and hands it to the subscriber; malformed frames are logged and
/// dropped.
pub(crate) fn deliver_frame(channel: &str, text: &str, listener: &ChannelListener) {
    match serde_json::from_str::<Value>(text) {
        Ok(payload) => listener(ChannelEvent {
            channel: channel.to_string(),
            payload,
        }),
        Err(err) => error!(channel = %channel, error = %err, "failed to parse socket message"),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use serde_json::json;

    use super::*;

    #[test]
    fn deliver_frame_drops_malformed_frames() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let listener: ChannelListener = Arc::new(move |event: ChannelEvent| {
            sink.lock().expect("lock").push(event);
        });

        deliver_frame("events", "{\"n\":1}", &listener);
        deliver_frame("events", "not json", &listener);

        let seen = seen.lock().expect("lock");
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].channel, "events");
        assert_eq!(seen[0].payload, json!({"n": 1}));
    }
}
