//! Message transport contracts: request/response, fire-and-forget, and subscriptions.

use std::{fmt, future::Future, pin::Pin, sync::Arc};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::error::HostResult;

/// Object-safe boxed future used by [`TransportService`] and [`IpcBridge`] async methods.
pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// One message delivered to a channel subscriber.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelEvent {
    /// Channel the message arrived on.
    pub channel: String,
    /// Decoded payload.
    pub payload: Value,
}

/// Callback invoked once per message on a subscribed channel.
pub type ChannelListener = Arc<dyn Fn(ChannelEvent) + Send + Sync>;

/// Cancellable handle returned by channel subscriptions.
///
/// Dropping the handle cancels the subscription, as does [`Subscription::unsubscribe`].
/// Cancelled subscriptions are never re-established.
#[must_use = "dropping a subscription cancels it"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Wraps the action that tears the subscription down.
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Subscription with nothing to cancel, returned when no channel was available.
    pub fn inert() -> Self {
        Self { cancel: None }
    }

    /// Returns `true` while a cancel action is still pending.
    pub fn is_active(&self) -> bool {
        self.cancel.is_some()
    }

    /// Cancels the subscription.
    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

/// Messaging surface between UI code and its backing service.
pub trait TransportService {
    /// Sends a request and waits for its response.
    fn invoke<'a>(
        &'a self,
        channel: &'a str,
        payload: Value,
    ) -> TransportFuture<'a, HostResult<Value>>;

    /// Sends a message without waiting for a response. Failures are logged, never returned.
    fn send(&self, channel: &str, payload: Value);

    /// Subscribes to messages pushed on `channel`.
    fn on(&self, channel: &str, listener: ChannelListener) -> Subscription;
}

/// Inter-process channel injected into the UI by a desktop host.
pub trait IpcBridge {
    /// Sends a request to the host process and waits for its response.
    fn invoke<'a>(
        &'a self,
        channel: &'a str,
        payload: Value,
    ) -> TransportFuture<'a, HostResult<Value>>;

    /// Sends a one-way message to the host process.
    fn send(&self, channel: &str, payload: Value);

    /// Registers a listener for messages the host process emits on `channel`.
    fn subscribe(&self, channel: &str, listener: ChannelListener) -> Subscription;
}

/// Serializes a request, invokes it through a [`TransportService`], and deserializes the
/// response.
///
/// # Errors
///
/// Returns an error when serialization, the call, or response deserialization fails.
pub async fn invoke_with<S, T, R>(transport: &S, channel: &str, request: &T) -> HostResult<R>
where
    S: TransportService + ?Sized,
    T: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let payload = serde_json::to_value(request)?;
    let response = transport.invoke(channel, payload).await?;
    Ok(serde_json::from_value(response)?)
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use super::*;

    #[test]
    fn subscription_cancels_once_on_unsubscribe() {
        let cancelled = Rc::new(Cell::new(0));
        let counter = Rc::clone(&cancelled);
        let subscription = Subscription::new(move || counter.set(counter.get() + 1));
        assert!(subscription.is_active());
        subscription.unsubscribe();
        assert_eq!(cancelled.get(), 1);
    }

    #[test]
    fn subscription_cancels_on_drop() {
        let cancelled = Rc::new(Cell::new(false));
        let flag = Rc::clone(&cancelled);
        {
            let _subscription = Subscription::new(move || flag.set(true));
        }
        assert!(cancelled.get());
    }

    #[test]
    fn inert_subscription_is_inactive() {
        let subscription = Subscription::inert();
        assert!(!subscription.is_active());
        assert_eq!(format!("{subscription:?}"), "Subscription { active: false }");
        subscription.unsubscribe();
    }
}
