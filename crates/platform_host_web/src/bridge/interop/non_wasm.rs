use std::future::Future;

use futures::StreamExt;
use platform_host::{ChannelListener, HostError, HostResult, Record, RuntimeSnapshot, Subscription};
use serde_json::Value;
use tokio::{runtime::Handle, sync::oneshot};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, warn};

use super::deliver_frame;

pub fn snapshot_runtime() -> RuntimeSnapshot {
    RuntimeSnapshot::native()
}

pub fn page_origin() -> Option<String> {
    None
}

const NO_INDEXED_DB: &str = "IndexedDB is only available in browser builds";

pub(crate) async fn idb_open(_database: &str, _version: u32, _schema: &Value) -> HostResult<()> {
    Err(HostError::unsupported(NO_INDEXED_DB))
}

pub(crate) fn idb_close(_database: &str) {}

pub(crate) async fn idb_get_all(_database: &str, _store: &str) -> HostResult<Vec<Record>> {
    Err(HostError::unsupported(NO_INDEXED_DB))
}

pub(crate) async fn idb_add(_database: &str, _store: &str, _record: &Record) -> HostResult<()> {
    Err(HostError::unsupported(NO_INDEXED_DB))
}

pub(crate) async fn idb_put(_database: &str, _store: &str, _record: &Record) -> HostResult<()> {
    Err(HostError::unsupported(NO_INDEXED_DB))
}

pub(crate) async fn idb_delete(_database: &str, _store: &str, _key: &Value) -> HostResult<()> {
    Err(HostError::unsupported(NO_INDEXED_DB))
}

pub(crate) fn spawn_detached<F>(label: &str, future: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    match Handle::try_current() {
        Ok(handle) => {
            handle.spawn(future);
        }
        Err(_) => warn!(task = %label, "no async runtime available; detached task dropped"),
    }
}

pub(crate) fn open_socket(url: String, channel: String, listener: ChannelListener) -> Subscription {
    let Ok(handle) = Handle::try_current() else {
        warn!(channel = %channel, "no async runtime available; subscription not opened");
        return Subscription::inert();
    };

    let (close_tx, mut close_rx) = oneshot::channel::<()>();
    handle.spawn(async move {
        let mut stream = match connect_async(url.as_str()).await {
            Ok((stream, _response)) => stream,
            Err(err) => {
                error!(channel = %channel, error = %err, "WebSocket error");
                return;
            }
        };
        debug!(channel = %channel, "socket subscription opened");

        loop {
            tokio::select! {
                _ = &mut close_rx => {
                    let _ = stream.close(None).await;
                    break;
                }
                frame = stream.next() => match frame {
                    Some(Ok(Message::Text(text))) => deliver_frame(&channel, &text, &listener),
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        error!(channel = %channel, error = %err, "WebSocket error");
                        break;
                    }
                },
            }
        }
        debug!(channel = %channel, "socket subscription closed");
    });

    Subscription::new(move || {
        let _ = close_tx.send(());
    })
}
