pub mod types;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use self::types::{MessageType, RequestId, Response};
use crate::error::{BridgeError, Result};

/// Message sent from the page to the host
///
/// Serializes to a flat JSON object whose `type` field is the discriminator:
/// `{"type":"publisher","eventName":..,"payload":..}` or
/// `{"type":"request","id":..,"payload":..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutboundMessage {
    Publisher {
        #[serde(rename = "eventName")]
        event_name: String,
        payload: Value,
    },
    Request {
        id: RequestId,
        payload: Value,
    },
}

impl OutboundMessage {
    pub fn publisher(event_name: impl Into<String>, payload: impl Into<Value>) -> Self {
        OutboundMessage::Publisher {
            event_name: event_name.into(),
            payload: payload.into(),
        }
    }

    pub fn request(id: RequestId, payload: impl Into<Value>) -> Self {
        OutboundMessage::Request {
            id,
            payload: payload.into(),
        }
    }

    pub fn msg_type(&self) -> MessageType {
        match self {
            OutboundMessage::Publisher { .. } => MessageType::Publisher,
            OutboundMessage::Request { .. } => MessageType::Request,
        }
    }

    /// Compact JSON, the form the host transport accepts
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(data: &str) -> Result<Self> {
        Ok(serde_json::from_str(data)?)
    }
}

/// Message delivered by the host to the bridge's inbound handler
///
/// Same shape as [`OutboundMessage`], but decoded loosely: `eventName` and
/// `id` are only meaningful for their own message type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    #[serde(rename = "type")]
    pub msg_type: MessageType,
    #[serde(rename = "eventName", default, skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
    #[serde(default)]
    pub payload: Value,
}

impl InboundMessage {
    pub fn publisher(event_name: impl Into<String>, payload: impl Into<Value>) -> Self {
        Self {
            msg_type: MessageType::Publisher,
            event_name: Some(event_name.into()),
            id: None,
            payload: payload.into(),
        }
    }

    /// A reply to a request, carrying a response envelope as payload
    pub fn response(id: RequestId, response: &Response) -> Result<Self> {
        Ok(Self {
            msg_type: MessageType::Request,
            event_name: None,
            id: Some(id),
            payload: serde_json::to_value(response)?,
        })
    }

    pub fn decode(data: &str) -> Result<Self> {
        Ok(serde_json::from_str(data)?)
    }

    /// Interpret the payload as a response envelope
    pub fn response_envelope(&self) -> Result<Response> {
        Response::deserialize(&self.payload)
            .map_err(|e| BridgeError::InvalidMessage(format!("Malformed response envelope: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_publisher_wire_format() {
        let msg = OutboundMessage::publisher("tick", 42);
        let value: Value = serde_json::from_str(&msg.encode().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({"type": "publisher", "eventName": "tick", "payload": 42})
        );
        let encoded = msg.encode().unwrap();
        assert!(encoded.starts_with(r#"{"type":"publisher""#));
        assert!(!encoded.contains(' '));
    }

    #[test]
    fn test_request_wire_format() {
        let id = RequestId::from_raw("msg_1_abcdefghi");
        let msg = OutboundMessage::request(id, json!({"op": "ping"}));
        let value: Value = serde_json::from_str(&msg.encode().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({"type": "request", "id": "msg_1_abcdefghi", "payload": {"op": "ping"}})
        );
    }

    #[test]
    fn test_inbound_decode_publisher() {
        let msg = InboundMessage::decode(r#"{"type":"publisher","eventName":"tick","payload":42}"#)
            .unwrap();
        assert_eq!(msg.msg_type, MessageType::Publisher);
        assert_eq!(msg.event_name.as_deref(), Some("tick"));
        assert_eq!(msg.id, None);
        assert_eq!(msg.payload, json!(42));
    }

    #[test]
    fn test_inbound_decode_response() {
        let msg = InboundMessage::decode(
            r#"{"type":"request","id":"msg_1_x","payload":{"status":"error","error":"boom"}}"#,
        )
        .unwrap();
        assert_eq!(msg.id, Some(RequestId::from_raw("msg_1_x")));
        assert_eq!(msg.response_envelope().unwrap(), Response::error("boom"));
    }

    #[test]
    fn test_inbound_missing_payload_is_null() {
        let msg = InboundMessage::decode(r#"{"type":"publisher","eventName":"ready"}"#).unwrap();
        assert_eq!(msg.payload, Value::Null);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            OutboundMessage::decode("{not json"),
            Err(BridgeError::Serialization(_))
        ));
    }

    #[test]
    fn test_inbound_rejects_unknown_type() {
        assert!(InboundMessage::decode(r#"{"type":"broadcast","payload":1}"#).is_err());
    }

    #[test]
    fn test_malformed_envelope() {
        let msg = InboundMessage {
            msg_type: MessageType::Request,
            event_name: None,
            id: Some(RequestId::from_raw("msg_1_x")),
            payload: json!({"status": "maybe"}),
        };
        assert!(matches!(
            msg.response_envelope(),
            Err(BridgeError::InvalidMessage(_))
        ));
    }
}
