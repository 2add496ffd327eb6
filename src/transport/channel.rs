use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, error::TryRecvError, unbounded_channel};

use crate::error::{TransportError, TransportResult};
use crate::message::OutboundMessage;
use crate::transport::{HostTransport, TransportStats};

/// In-process transport whose other end is a [`HostEndpoint`]
///
/// Useful for embedding the bridge in a native shell that runs on the same
/// process, and for driving the bridge from tests.
pub struct ChannelTransport {
    sender: UnboundedSender<String>,
    stats: Arc<Mutex<TransportStats>>,
    name: String,
}

/// Host side of a [`ChannelTransport`] pair
pub struct HostEndpoint {
    receiver: UnboundedReceiver<String>,
    name: String,
}

impl ChannelTransport {
    /// Create a connected page/host pair
    pub fn create_pair(name: impl Into<String>) -> (Self, HostEndpoint) {
        let name = name.into();
        let (tx, rx) = unbounded_channel();

        let transport = Self {
            sender: tx,
            stats: Arc::new(Mutex::new(TransportStats::default())),
            name: format!("{}-page", name),
        };
        let endpoint = HostEndpoint {
            receiver: rx,
            name: format!("{}-host", name),
        };

        (transport, endpoint)
    }
}

impl HostTransport for ChannelTransport {
    fn post_message(&self, message: &str) -> TransportResult<()> {
        match self.sender.send(message.to_string()) {
            Ok(()) => {
                let mut stats = self.stats.lock();
                stats.messages_sent += 1;
                stats.bytes_sent += message.len() as u64;
                Ok(())
            }
            Err(_) => {
                self.stats.lock().send_errors += 1;
                Err(TransportError::Closed)
            }
        }
    }

    fn is_connected(&self) -> bool {
        !self.sender.is_closed()
    }

    fn stats(&self) -> Option<TransportStats> {
        Some(self.stats.lock().clone())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for ChannelTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelTransport")
            .field("name", &self.name)
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl HostEndpoint {
    /// Wait for the next serialized message posted by the page
    pub async fn recv(&mut self) -> TransportResult<String> {
        self.receiver.recv().await.ok_or(TransportError::Closed)
    }

    /// Wait for the next message and decode it
    pub async fn recv_message(&mut self) -> TransportResult<OutboundMessage> {
        let raw = self.recv().await?;
        OutboundMessage::decode(&raw).map_err(|e| TransportError::Protocol(e.to_string()))
    }

    /// Non-blocking receive
    pub fn try_recv(&mut self) -> TransportResult<Option<String>> {
        match self.receiver.try_recv() {
            Ok(message) => Ok(Some(message)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(TransportError::Closed),
        }
    }

    /// Stop accepting messages; the page transport reports disconnected afterwards
    pub fn close(&mut self) {
        self.receiver.close();
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for HostEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostEndpoint")
            .field("name", &self.name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_post_and_recv() {
        let (transport, mut host) = ChannelTransport::create_pair("test");

        transport.post_message(r#"{"hello":1}"#).unwrap();
        assert_eq!(host.recv().await.unwrap(), r#"{"hello":1}"#);

        let stats = transport.stats().unwrap();
        assert_eq!(stats.messages_sent, 1);
        assert_eq!(stats.bytes_sent, 11);
    }

    #[tokio::test]
    async fn test_recv_message_decodes() {
        let (transport, mut host) = ChannelTransport::create_pair("test");
        let msg = OutboundMessage::publisher("tick", json!(1));
        transport.post_message(&msg.encode().unwrap()).unwrap();

        assert_eq!(host.recv_message().await.unwrap(), msg);
    }

    #[test]
    fn test_closed_host_counts_send_errors() {
        let (transport, mut host) = ChannelTransport::create_pair("test");
        assert!(transport.is_connected());
        assert_eq!(host.try_recv().unwrap(), None);

        host.close();
        assert!(!transport.is_connected());
        assert!(matches!(
            transport.post_message("{}"),
            Err(TransportError::Closed)
        ));
        assert_eq!(transport.stats().unwrap().send_errors, 1);
    }

    #[test]
    fn test_pair_names() {
        let (transport, host) = ChannelTransport::create_pair("shell");
        assert_eq!(transport.name(), "shell-page");
        assert_eq!(host.name(), "shell-host");
    }
}
