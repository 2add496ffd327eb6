use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt::Debug;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, error, warn};

use crate::error::{BridgeError, Result};
use crate::host::HostBindings;
use crate::message::types::{
    DEFAULT_TIMEOUT, JAVASCRIPT_CHANNEL, MessageType, NATIVE_CHANNEL, RequestId, Response,
};
use crate::message::{InboundMessage, OutboundMessage};
use crate::pending::{PendingGuard, PendingRequests};
use crate::subscription::{Subscriber, SubscriberTable, Subscription};
use crate::transport::HostTransport;

/// Configuration for a [`Bridge`]
#[derive(Clone, Debug)]
pub struct BridgeConfig {
    pub default_timeout: Duration,
    pub transport_binding: String,
    pub inbound_binding: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            default_timeout: DEFAULT_TIMEOUT,
            transport_binding: NATIVE_CHANNEL.to_string(),
            inbound_binding: JAVASCRIPT_CHANNEL.to_string(),
        }
    }
}

impl BridgeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn with_transport_binding(mut self, name: impl Into<String>) -> Self {
        self.transport_binding = name.into();
        self
    }

    pub fn with_inbound_binding(mut self, name: impl Into<String>) -> Self {
        self.inbound_binding = name.into();
        self
    }
}

/// Messaging bridge between the page and the host shell
///
/// Cloning is cheap and every clone shares the same subscriber and pending
/// tables. The application should construct one bridge at startup and hand
/// clones to whatever needs it.
#[derive(Clone)]
pub struct Bridge {
    transport: Option<Arc<dyn HostTransport>>,
    subscribers: Arc<Mutex<SubscriberTable>>,
    pending: Arc<PendingRequests>,
    config: BridgeConfig,
}

impl Bridge {
    pub fn new<T: HostTransport + 'static>(transport: T, config: BridgeConfig) -> Self {
        Self::from_parts(Some(Arc::new(transport)), config)
    }

    /// A bridge with no host transport: publish is a no-op and every request
    /// times out.
    pub fn disabled(config: BridgeConfig) -> Self {
        Self::from_parts(None, config)
    }

    pub fn from_parts(transport: Option<Arc<dyn HostTransport>>, config: BridgeConfig) -> Self {
        if transport.is_none() {
            warn!(
                "Running in web environment - {} is not available",
                config.transport_binding
            );
        }
        Self {
            transport,
            subscribers: Arc::new(Mutex::new(SubscriberTable::default())),
            pending: Arc::new(PendingRequests::new()),
            config,
        }
    }

    /// Look up the host transport in `bindings` and, if it is there, install
    /// this bridge's inbound handler.
    pub fn attach(bindings: &HostBindings, config: BridgeConfig) -> Result<Self> {
        let transport = bindings.transport(&config.transport_binding);
        let bridge = Self::from_parts(transport, config);

        if bridge.is_channel_available() {
            let handler = bridge.clone();
            bindings.install_handler(
                &bridge.config.inbound_binding,
                Arc::new(move |message: InboundMessage| handler.handle_inbound(message)),
            )?;
            debug!(
                transport = %bridge.config.transport_binding,
                inbound = %bridge.config.inbound_binding,
                "bridge attached to host"
            );
        }

        Ok(bridge)
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn is_channel_available(&self) -> bool {
        self.transport.is_some()
    }

    /// Fire-and-forget send. Failures are logged and never reach the caller.
    pub fn publish(&self, message: &OutboundMessage) {
        let Some(transport) = &self.transport else {
            return;
        };

        let encoded = match message.encode() {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!(error = %e, "failed to serialize outbound message");
                return;
            }
        };

        if let Err(e) = transport.post_message(&encoded) {
            warn!(
                transport = transport.name(),
                msg_type = message.msg_type().as_str(),
                error = %e,
                "failed to post message to host"
            );
        }
    }

    /// Publish a named event. A payload that fails to serialize is logged and dropped.
    pub fn publish_event<T: Serialize>(&self, event_name: &str, payload: &T) {
        match serde_json::to_value(payload) {
            Ok(payload) => self.publish(&OutboundMessage::publisher(event_name, payload)),
            Err(e) => warn!(event = event_name, error = %e, "failed to serialize event payload"),
        }
    }

    pub fn subscribe<F>(&self, event_name: &str, callback: F) -> Subscription
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.subscribe_arc(event_name, Arc::new(callback))
    }

    /// Subscribe a shared callback. Keep a clone of the `Arc` to remove it
    /// later with [`Bridge::unsubscribe`].
    pub fn subscribe_arc(&self, event_name: &str, callback: Subscriber) -> Subscription {
        let id = self.subscribers.lock().insert(event_name, callback.clone());
        Subscription::new(
            event_name.to_string(),
            id,
            callback,
            Arc::downgrade(&self.subscribers),
        )
    }

    /// Subscribe with a payload decoded into `T`. Payloads that do not decode
    /// are logged and skipped.
    pub fn subscribe_typed<T, F>(&self, event_name: &str, callback: F) -> Subscription
    where
        T: DeserializeOwned + 'static,
        F: Fn(T) + Send + Sync + 'static,
    {
        let event = event_name.to_string();
        self.subscribe(event_name, move |payload: &Value| match T::deserialize(payload) {
            Ok(decoded) => callback(decoded),
            Err(e) => warn!(
                event = %event,
                error = %e,
                "event payload did not match subscriber type"
            ),
        })
    }

    /// Remove every registration of `callback` under `event_name`
    pub fn unsubscribe(&self, event_name: &str, callback: &Subscriber) {
        self.subscribers.lock().remove_callback(event_name, callback);
    }

    pub fn subscriber_count(&self, event_name: &str) -> usize {
        self.subscribers.lock().count(event_name)
    }

    pub async fn request<T: Serialize>(&self, payload: &T) -> Result<Value> {
        self.request_with_timeout(payload, self.config.default_timeout)
            .await
    }

    /// Send a request and wait for the matching response, or fail with
    /// [`BridgeError::Timeout`] once `timeout` elapses.
    pub async fn request_with_timeout<T: Serialize>(
        &self,
        payload: &T,
        timeout: Duration,
    ) -> Result<Value> {
        let payload = serde_json::to_value(payload)?;

        let (tx, rx) = oneshot::channel();
        let id = self.pending.register(tx);
        let _guard = PendingGuard::new(self.pending.clone(), id.clone());

        self.publish(&OutboundMessage::request(id.clone(), payload));

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(outcome)) => outcome,
            // The sender only goes away through settle, which sends first.
            Ok(Err(_)) | Err(_) => {
                debug!(id = %id, ?timeout, "request timed out");
                Err(BridgeError::Timeout)
            }
        }
    }

    pub async fn request_typed<Req, Resp>(&self, payload: &Req) -> Result<Resp>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let data = self.request(payload).await?;
        Ok(serde_json::from_value(data)?)
    }

    pub fn pending_requests(&self) -> usize {
        self.pending.len()
    }

    /// Dispatch one message delivered by the host
    pub fn handle_inbound(&self, message: InboundMessage) {
        match message.msg_type {
            MessageType::Publisher => match message.event_name.as_deref() {
                Some(event_name) => self.dispatch_event(event_name, &message.payload),
                None => debug!("publisher message without eventName ignored"),
            },
            MessageType::Request => match &message.id {
                Some(id) => self.dispatch_response(id, &message),
                None => debug!("request message without id ignored"),
            },
        }
    }

    /// Decode a JSON message from the host and dispatch it
    pub fn handle_inbound_json(&self, data: &str) -> Result<()> {
        let message = InboundMessage::decode(data).inspect_err(|e| {
            warn!(error = %e, "malformed inbound message");
        })?;
        self.handle_inbound(message);
        Ok(())
    }

    fn dispatch_event(&self, event_name: &str, payload: &Value) {
        let subscribers = self.subscribers.lock().snapshot(event_name);
        if subscribers.is_empty() {
            debug!(event = event_name, "no subscribers for event");
            return;
        }

        for (index, callback) in subscribers.iter().enumerate() {
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| callback(payload))) {
                let reason = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(event = event_name, subscriber = index, %reason, "subscriber panicked");
            }
        }
    }

    fn dispatch_response(&self, id: &RequestId, message: &InboundMessage) {
        let outcome = message.response_envelope().and_then(Response::into_result);

        if !self.pending.settle(id, outcome) {
            debug!(id = %id, "dropping response for unknown or settled request");
        }
    }
}

impl Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("channel_available", &self.is_channel_available())
            .field("pending_requests", &self.pending.len())
            .field("default_timeout", &self.config.default_timeout)
            .finish()
    }
}
