//! Wire-message classification and reply constants.
//!
//! Every request frame carries a JSON object. `QUERY` and `ACTION` are
//! recognized by their `type` field; anything else is treated as a raw
//! [`ClaudeEvent`].
//!
//! Replies are asymmetric on purpose, for compatibility with the hook
//! contract: QUERY/ACTION answers are framed JSON, while event acks and
//! parse errors are the raw unframed bytes [`ACK`] and [`ERR`]. A client
//! must know which kind of reply to expect from what it sent.

use serde_json::{Value, json};

use crate::event::ClaudeEvent;

/// Hard ceiling on a frame payload. A claimed length beyond this aborts
/// the connection before any payload byte is read.
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

/// Raw unframed acknowledgment for event messages.
pub const ACK: &[u8; 2] = b"OK";

/// Raw unframed reply for a payload that failed to parse as JSON.
pub const ERR: &[u8; 3] = b"ERR";

/// A decoded request, classified by its `type` field.
#[derive(Debug, Clone, PartialEq)]
pub enum WireMessage {
    Query { query: String },
    Action { action: String, data: Value },
    Event(ClaudeEvent),
}

impl WireMessage {
    /// Classify a decoded JSON value. Total: anything that is not a
    /// QUERY or ACTION becomes an event.
    pub fn classify(value: Value) -> Self {
        match value.get("type").and_then(Value::as_str) {
            Some("QUERY") => Self::Query {
                query: value
                    .get("query")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_owned(),
            },
            Some("ACTION") => Self::Action {
                action: value
                    .get("action")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_owned(),
                data: value
                    .get("data")
                    .cloned()
                    .unwrap_or_else(|| json!({})),
            },
            _ => Self::Event(ClaudeEvent::from_value(value)),
        }
    }

    /// Encode for the wire. The inverse of [`WireMessage::classify`] up to
    /// field defaults.
    pub fn encode(&self) -> Value {
        match self {
            Self::Query { query } => json!({"type": "QUERY", "query": query}),
            Self::Action { action, data } => {
                json!({"type": "ACTION", "action": action, "data": data})
            }
            Self::Event(event) => {
                serde_json::to_value(event).unwrap_or_else(|_| json!({}))
            }
        }
    }
}
