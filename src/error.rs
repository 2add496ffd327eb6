use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    /// No response arrived before the request timer fired
    #[error("Timeout")]
    Timeout,

    /// Error string supplied by the host in an error envelope
    #[error("{0}")]
    Remote(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Inbound handler already installed under '{0}'")]
    HandlerAlreadyInstalled(String),
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Transport closed")]
    Closed,

    #[error("Protocol error: {0}")]
    Protocol(String),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
pub type TransportResult<T> = std::result::Result<T, TransportError>;

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::Serialization(err.to_string())
    }
}
