//! Host capability bridges for `platform_host_web` strategies.
//!
//! - [`DesktopBridge`] wraps the IPC channel a desktop host may inject.
//! - `interop` routes runtime snapshots, detached tasks, socket subscriptions, IndexedDB access,
//!   and the browser file pickers to the target-specific implementation.

mod interop;

use std::{fmt, rc::Rc};

use platform_host::{HostError, HostResult, IpcBridge};
use serde::de::DeserializeOwned;
use serde_json::Value;

pub(crate) use interop::{
    idb_add, idb_close, idb_delete, idb_get_all, idb_open, idb_put, open_socket, spawn_detached,
};
#[cfg(target_arch = "wasm32")]
pub(crate) use interop::post_keepalive;
#[cfg(target_arch = "wasm32")]
pub use interop::{BrowserFileAccessPicker, BrowserFileInput};
pub use interop::{page_origin, snapshot_runtime};

/// Message used when a desktop strategy runs without an injected IPC channel.
pub const BRIDGE_UNAVAILABLE: &str = "desktop IPC bridge not available";

/// Optional handle to the IPC channel injected by a desktop host.
#[derive(Clone, Default)]
pub struct DesktopBridge {
    inner: Option<Rc<dyn IpcBridge>>,
}

impl DesktopBridge {
    /// Wraps an injected IPC channel.
    pub fn new(bridge: Rc<dyn IpcBridge>) -> Self {
        Self {
            inner: Some(bridge),
        }
    }

    /// Handle for a runtime where no channel was injected.
    pub fn absent() -> Self {
        Self::default()
    }

    /// Returns `true` when a channel was injected.
    pub fn is_available(&self) -> bool {
        self.inner.is_some()
    }

    pub(crate) fn get(&self) -> Option<&Rc<dyn IpcBridge>> {
        self.inner.as_ref()
    }

    /// Forwards a request verbatim and returns the host's response unmodified.
    ///
    /// # Errors
    ///
    /// Returns a transport error when no channel was injected, or the host's own error.
    pub async fn invoke(&self, channel: &str, payload: Value) -> HostResult<Value> {
        let Some(bridge) = self.get() else {
            return Err(HostError::transport(BRIDGE_UNAVAILABLE));
        };
        bridge.invoke(channel, payload).await
    }

    /// Forwards a request and deserializes the host's response.
    ///
    /// # Errors
    ///
    /// Same as [`DesktopBridge::invoke`], plus response deserialization failures.
    pub async fn invoke_as<R: DeserializeOwned>(
        &self,
        channel: &str,
        payload: Value,
    ) -> HostResult<R> {
        let response = self.invoke(channel, payload).await?;
        Ok(serde_json::from_value(response)?)
    }
}

impl fmt::Debug for DesktopBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DesktopBridge")
            .field("available", &self.is_available())
            .finish()
    }
}
