//! shellbridge - JSON messaging between a web page and its host application shell
pub mod bridge;
pub mod error;
pub mod host;
pub mod message;
mod pending;
pub mod subscription;
pub mod transport;

pub use bridge::{Bridge, BridgeConfig};
pub use error::{BridgeError, Result, TransportError, TransportResult};
pub use host::{HostBindings, InboundHandler};
pub use message::types::{
    DEFAULT_TIMEOUT, JAVASCRIPT_CHANNEL, MessageType, NATIVE_CHANNEL, RequestId, Response,
};
pub use message::{InboundMessage, OutboundMessage};
pub use subscription::{Subscriber, Subscription};
pub use transport::callback::FnTransport;
pub use transport::channel::{ChannelTransport, HostEndpoint};
pub use transport::{HostTransport, TransportStats};
