//! Recording IPC bridge used by desktop strategy tests.

use std::{
    cell::RefCell,
    collections::HashMap,
    rc::{Rc, Weak},
};

use platform_host::{
    ChannelEvent, ChannelListener, HostResult, IpcBridge, Subscription, TransportFuture,
};
use serde_json::Value;

type ListenerTable = RefCell<Vec<(u64, String, ChannelListener)>>;

#[derive(Default)]
pub(crate) struct RecordingBridge {
    invoked: RefCell<Vec<(String, Value)>>,
    sent: RefCell<Vec<(String, Value)>>,
    responses: RefCell<HashMap<String, HostResult<Value>>>,
    listeners: Rc<ListenerTable>,
    next_listener_id: RefCell<u64>,
}

impl RecordingBridge {
    pub(crate) fn respond(&self, channel: &str, response: HostResult<Value>) {
        self.responses
            .borrow_mut()
            .insert(channel.to_string(), response);
    }

    pub(crate) fn invoked(&self) -> Vec<(String, Value)> {
        self.invoked.borrow().clone()
    }

    pub(crate) fn sent(&self) -> Vec<(String, Value)> {
        self.sent.borrow().clone()
    }

    pub(crate) fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub(crate) fn emit(&self, channel: &str, payload: Value) {
        let listeners: Vec<ChannelListener> = self
            .listeners
            .borrow()
            .iter()
            .filter(|(_, subscribed, _)| subscribed == channel)
            .map(|(_, _, listener)| ChannelListener::clone(listener))
            .collect();
        for listener in listeners {
            listener(ChannelEvent {
                channel: channel.to_string(),
                payload: payload.clone(),
            });
        }
    }
}

impl IpcBridge for RecordingBridge {
    fn invoke<'a>(
        &'a self,
        channel: &'a str,
        payload: Value,
    ) -> TransportFuture<'a, HostResult<Value>> {
        Box::pin(async move {
            self.invoked
                .borrow_mut()
                .push((channel.to_string(), payload));
            self.responses
                .borrow()
                .get(channel)
                .cloned()
                .unwrap_or(Ok(Value::Null))
        })
    }

    fn send(&self, channel: &str, payload: Value) {
        self.sent.borrow_mut().push((channel.to_string(), payload));
    }

    fn subscribe(&self, channel: &str, listener: ChannelListener) -> Subscription {
        let id = {
            let mut next = self.next_listener_id.borrow_mut();
            *next += 1;
            *next
        };
        self.listeners
            .borrow_mut()
            .push((id, channel.to_string(), listener));

        let table: Weak<ListenerTable> = Rc::downgrade(&self.listeners);
        Subscription::new(move || {
            if let Some(table) = table.upgrade() {
                table.borrow_mut().retain(|(existing, _, _)| *existing != id);
            }
        })
    }
}
