// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! DAP message envelope: a typed head plus an opaque JSON body tail.
//!
//! Bodies are decoded on demand at each call site; this preserves
//! forward-compatibility with adapter-specific extensions.

use crate::ProtocolError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outgoing DAP request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DapRequest {
    pub seq: i64,
    pub command: String,
    #[serde(default)]
    pub arguments: Value,
}

/// Response correlated to a request by `request_seq`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DapResponse {
    #[serde(default)]
    pub seq: i64,
    pub request_seq: i64,
    pub success: bool,
    #[serde(default)]
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub body: Value,
}

/// Adapter-initiated event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DapEvent {
    #[serde(default)]
    pub seq: i64,
    pub event: String,
    #[serde(default)]
    pub body: Value,
}

/// One decoded DAP message.
#[derive(Debug, Clone, PartialEq)]
pub enum DapMessage {
    Request(DapRequest),
    Response(DapResponse),
    Event(DapEvent),
    /// Message type the relay does not know; readers ignore it.
    Other { kind: String },
}

/// Decode a frame body into a message. Invalid UTF-8 or JSON is a fatal
/// stream error for the owning client.
pub fn decode(body: &[u8]) -> Result<DapMessage, ProtocolError> {
    let text = std::str::from_utf8(body).map_err(|_| ProtocolError::InvalidUtf8)?;
    let value: Value = serde_json::from_str(text)?;

    let kind = value.get("type").and_then(Value::as_str).unwrap_or_default().to_string();
    match kind.as_str() {
        "request" => Ok(DapMessage::Request(serde_json::from_value(value)?)),
        "response" => Ok(DapMessage::Response(serde_json::from_value(value)?)),
        "event" => Ok(DapMessage::Event(serde_json::from_value(value)?)),
        _ => Ok(DapMessage::Other { kind }),
    }
}

/// Encode a message to a frame body, serialising exactly once.
pub fn encode(message: &DapMessage) -> Result<Vec<u8>, ProtocolError> {
    let (mut value, kind) = match message {
        DapMessage::Request(r) => (serde_json::to_value(r)?, "request"),
        DapMessage::Response(r) => (serde_json::to_value(r)?, "response"),
        DapMessage::Event(e) => (serde_json::to_value(e)?, "event"),
        DapMessage::Other { kind } => (Value::Object(serde_json::Map::new()), {
            // Not sent by the relay; encoded only for completeness.
            kind.as_str()
        }),
    };

    if let Value::Object(map) = &mut value {
        map.insert("type".to_string(), Value::String(kind.to_string()));
    }
    Ok(serde_json::to_vec(&value)?)
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
