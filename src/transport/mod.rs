use std::fmt::Debug;

use crate::error::TransportResult;

pub mod callback;
pub mod channel;

/// Host-provided object that accepts serialized messages from the page
///
/// This is the single outbound operation the host exposes ("postMessage").
/// Implementations must not block for long: publish is called synchronously.
pub trait HostTransport: Send + Sync + Debug {
    /// Hand one serialized message to the host
    fn post_message(&self, message: &str) -> TransportResult<()>;

    /// Check if the host side is still listening
    fn is_connected(&self) -> bool {
        true
    }

    /// Get transport statistics
    fn stats(&self) -> Option<TransportStats> {
        None
    }

    /// Get transport name/identifier
    fn name(&self) -> &str {
        "unknown"
    }
}

/// Statistics collected by transport implementations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportStats {
    pub messages_sent: u64,
    pub bytes_sent: u64,
    pub send_errors: u64,
}

impl<T: HostTransport + ?Sized> HostTransport for std::sync::Arc<T> {
    fn post_message(&self, message: &str) -> TransportResult<()> {
        (**self).post_message(message)
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn stats(&self) -> Option<TransportStats> {
        (**self).stats()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<T: HostTransport + ?Sized> HostTransport for Box<T> {
    fn post_message(&self, message: &str) -> TransportResult<()> {
        (**self).post_message(message)
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn stats(&self) -> Option<TransportStats> {
        (**self).stats()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::channel::ChannelTransport;
    use std::sync::Arc;

    #[test]
    fn test_arc_forwards_to_inner() {
        let (transport, _host) = ChannelTransport::create_pair("test");
        let shared: Arc<dyn HostTransport> = Arc::new(transport);

        shared.post_message("{}").unwrap();
        assert_eq!(shared.name(), "test-page");
        assert!(shared.is_connected());
        assert_eq!(
            shared.stats().unwrap(),
            TransportStats {
                messages_sent: 1,
                bytes_sent: 2,
                send_errors: 0,
            }
        );
    }
}
