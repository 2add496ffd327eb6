use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::{BridgeError, Result};

/// Binding slot under which the host exposes its transport
pub const NATIVE_CHANNEL: &str = "flutterChannel";
/// Binding slot under which the bridge installs its inbound handler
pub const JAVASCRIPT_CHANNEL: &str = "javascriptChannel";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

const ID_SUFFIX_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    /// Generate an id shaped `msg_<unix-millis>_<9 base36 chars>`
    pub fn generate() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let mut rng = rand::thread_rng();
        let suffix: String = (0..ID_SUFFIX_LEN)
            .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
            .collect();
        RequestId(format!("msg_{}_{}", millis, suffix))
    }

    pub fn from_raw(id: impl Into<String>) -> Self {
        RequestId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Publisher,
    Request,
}

impl MessageType {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageType::Publisher => "publisher",
            MessageType::Request => "request",
        }
    }
}

/// Envelope the host places in the payload of a request-type reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Response {
    Success {
        #[serde(default)]
        data: Value,
    },
    Error {
        error: String,
    },
}

impl Response {
    pub fn success(data: impl Into<Value>) -> Self {
        Response::Success { data: data.into() }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Response::Error {
            error: error.into(),
        }
    }

    /// Convert into the caller-facing result
    pub fn into_result(self) -> Result<Value> {
        match self {
            Response::Success { data } => Ok(data),
            Response::Error { error } => Err(BridgeError::Remote(error)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    #[test]
    fn test_request_id_shape() {
        let id = RequestId::generate();
        let parts: Vec<&str> = id.as_str().splitn(3, '_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "msg");
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[2].len(), 9);
        assert!(parts[2].bytes().all(|b| BASE36.contains(&b)));
    }

    #[test]
    fn test_request_ids_are_unique() {
        let ids: HashSet<RequestId> = (0..1000).map(|_| RequestId::generate()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_message_type_wire_names() {
        assert_eq!(serde_json::to_value(MessageType::Publisher).unwrap(), json!("publisher"));
        assert_eq!(serde_json::to_value(MessageType::Request).unwrap(), json!("request"));
        assert_eq!(MessageType::Request.as_str(), "request");
    }

    #[test]
    fn test_response_wire_shape() {
        let success: Response =
            serde_json::from_value(json!({"status": "success", "data": "pong"})).unwrap();
        assert_eq!(success, Response::success("pong"));

        let error: Response =
            serde_json::from_value(json!({"status": "error", "error": "nope"})).unwrap();
        assert_eq!(error, Response::error("nope"));

        let missing_data: Response = serde_json::from_value(json!({"status": "success"})).unwrap();
        assert_eq!(missing_data, Response::Success { data: Value::Null });
    }

    #[test]
    fn test_response_into_result() {
        assert_eq!(Response::success(42).into_result().unwrap(), json!(42));
        match Response::error("denied").into_result() {
            Err(BridgeError::Remote(msg)) => assert_eq!(msg, "denied"),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
