use parking_lot::RwLock;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use crate::error::{BridgeError, Result};
use crate::message::InboundMessage;
use crate::transport::HostTransport;

/// Handler the host invokes with each decoded inbound message
pub type InboundHandler = Arc<dyn Fn(InboundMessage) + Send + Sync>;

/// Well-known binding slots shared between the page and the host shell
///
/// The host injects its transport under a name; the bridge installs its
/// inbound handler under another. A handler slot is written once and is
/// never cleared for the lifetime of the bindings.
#[derive(Default)]
pub struct HostBindings {
    transports: RwLock<HashMap<String, Arc<dyn HostTransport>>>,
    handlers: RwLock<HashMap<String, InboundHandler>>,
}

impl HostBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expose a transport under `name`. Replaces any previous binding.
    pub fn bind_transport<T>(&self, name: impl Into<String>, transport: T)
    where
        T: HostTransport + 'static,
    {
        self.transports.write().insert(name.into(), Arc::new(transport));
    }

    pub fn transport(&self, name: &str) -> Option<Arc<dyn HostTransport>> {
        self.transports.read().get(name).cloned()
    }

    /// Install the inbound handler under `name`. Fails if one is already set.
    pub fn install_handler(&self, name: &str, handler: InboundHandler) -> Result<()> {
        match self.handlers.write().entry(name.to_string()) {
            Entry::Occupied(_) => Err(BridgeError::HandlerAlreadyInstalled(name.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(handler);
                Ok(())
            }
        }
    }

    pub fn has_handler(&self, name: &str) -> bool {
        self.handlers.read().contains_key(name)
    }

    /// Host side: hand a decoded message to the handler under `name`.
    /// Returns false when nothing is installed there.
    pub fn deliver(&self, name: &str, message: InboundMessage) -> bool {
        // Clone out so the handler runs without the lock held.
        let handler = self.handlers.read().get(name).cloned();
        match handler {
            Some(handler) => {
                handler(message);
                true
            }
            None => false,
        }
    }

    /// Host side: decode a JSON message and deliver it
    pub fn deliver_json(&self, name: &str, data: &str) -> Result<bool> {
        let message = InboundMessage::decode(data)?;
        Ok(self.deliver(name, message))
    }
}

impl std::fmt::Debug for HostBindings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let transports: Vec<String> = self.transports.read().keys().cloned().collect();
        let handlers: Vec<String> = self.handlers.read().keys().cloned().collect();
        f.debug_struct("HostBindings")
            .field("transports", &transports)
            .field("handlers", &handlers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::channel::ChannelTransport;
    use parking_lot::Mutex;

    #[test]
    fn test_transport_lookup() {
        let bindings = HostBindings::new();
        assert!(bindings.transport("flutterChannel").is_none());

        let (transport, _host) = ChannelTransport::create_pair("test");
        bindings.bind_transport("flutterChannel", transport);
        let found = bindings.transport("flutterChannel").unwrap();
        assert_eq!(found.name(), "test-page");
    }

    #[test]
    fn test_handler_is_set_once() {
        let bindings = HostBindings::new();
        let handler: InboundHandler = Arc::new(|_: InboundMessage| {});
        bindings.install_handler("javascriptChannel", handler.clone()).unwrap();

        let err = bindings
            .install_handler("javascriptChannel", handler)
            .unwrap_err();
        assert!(matches!(
            err,
            BridgeError::HandlerAlreadyInstalled(name) if name == "javascriptChannel"
        ));
    }

    #[test]
    fn test_deliver() {
        let bindings = HostBindings::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        bindings
            .install_handler(
                "javascriptChannel",
                Arc::new(move |msg: InboundMessage| sink.lock().push(msg)),
            )
            .unwrap();

        assert!(bindings.deliver("javascriptChannel", InboundMessage::publisher("tick", 1)));
        assert!(!bindings.deliver("elsewhere", InboundMessage::publisher("tick", 2)));
        assert!(
            bindings
                .deliver_json(
                    "javascriptChannel",
                    r#"{"type":"publisher","eventName":"tick","payload":3}"#
                )
                .unwrap()
        );
        assert!(bindings.deliver_json("javascriptChannel", "nope").is_err());

        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].payload, 3);
    }
}
