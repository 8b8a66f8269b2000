//! Events a hook client puts on the wire.
//!
//! Forward-compatible: unknown `"type"` strings deserialize into
//! [`ClaudeEventType::Notification`] instead of failing, so a newer hook
//! script can always talk to an older daemon.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Closed set of external event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClaudeEventType {
    SessionStart,
    SessionEnd,
    ToolStart,
    ToolComplete,
    AgentSpawn,
    AgentComplete,
    UserPrompt,
    AgentThinking,
    AgentIdle,
    /// Catch-all. Any unrecognized type string lands here.
    Notification,
}

impl ClaudeEventType {
    fn from_tag(tag: &str) -> Self {
        match tag {
            "SESSION_START" => Self::SessionStart,
            "SESSION_END" => Self::SessionEnd,
            "TOOL_START" => Self::ToolStart,
            "TOOL_COMPLETE" => Self::ToolComplete,
            "AGENT_SPAWN" => Self::AgentSpawn,
            "AGENT_COMPLETE" => Self::AgentComplete,
            "USER_PROMPT" => Self::UserPrompt,
            "AGENT_THINKING" => Self::AgentThinking,
            "AGENT_IDLE" => Self::AgentIdle,
            _ => Self::Notification,
        }
    }
}

/// Forward-compatible deserializer: unknown tags become `Notification`.
impl<'de> Deserialize<'de> for ClaudeEventType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let tag = String::deserialize(deserializer)?;
        Ok(Self::from_tag(&tag))
    }
}

/// One external event as sent by a hook client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaudeEvent {
    #[serde(rename = "type")]
    pub event_type: ClaudeEventType,
    /// Seconds since UNIX epoch, fractional.
    #[serde(default)]
    pub timestamp: f64,
    #[serde(default = "empty_object")]
    pub payload: Value,
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

impl ClaudeEvent {
    pub fn new(event_type: ClaudeEventType, timestamp: f64, payload: Value) -> Self {
        Self {
            event_type,
            timestamp,
            payload,
        }
    }

    /// Total conversion from an arbitrary decoded JSON value.
    ///
    /// Anything that does not parse as a well-formed event becomes a
    /// `NOTIFICATION` carrying whatever object fields were present.
    pub fn from_value(value: Value) -> Self {
        match serde_json::from_value::<ClaudeEvent>(value.clone()) {
            Ok(event) => event,
            Err(_) => {
                let payload = if value.is_object() {
                    value
                } else {
                    empty_object()
                };
                Self {
                    event_type: ClaudeEventType::Notification,
                    timestamp: 0.0,
                    payload,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn known_type_roundtrip() {
        let event = ClaudeEvent::new(
            ClaudeEventType::ToolStart,
            1_700_000_000.5,
            json!({"tool_name": "Read"}),
        );
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"TOOL_START\""));
        let back: ClaudeEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn unknown_type_becomes_notification() {
        let value = json!({"type": "FUTURE_THING", "timestamp": 1.0, "payload": {"k": "v"}});
        let event = ClaudeEvent::from_value(value);
        assert_eq!(event.event_type, ClaudeEventType::Notification);
        assert_eq!(event.payload["k"], "v");
    }

    #[test]
    fn missing_fields_default() {
        let event = ClaudeEvent::from_value(json!({"type": "SESSION_END"}));
        assert_eq!(event.event_type, ClaudeEventType::SessionEnd);
        assert_eq!(event.timestamp, 0.0);
        assert!(event.payload.is_object());
    }

    #[test]
    fn non_object_value_is_total() {
        let event = ClaudeEvent::from_value(json!(42));
        assert_eq!(event.event_type, ClaudeEventType::Notification);
        assert!(event.payload.as_object().unwrap().is_empty());
    }

    #[test]
    fn all_type_tags_serialize_screaming_snake() {
        let pairs = [
            (ClaudeEventType::SessionStart, "SESSION_START"),
            (ClaudeEventType::SessionEnd, "SESSION_END"),
            (ClaudeEventType::ToolStart, "TOOL_START"),
            (ClaudeEventType::ToolComplete, "TOOL_COMPLETE"),
            (ClaudeEventType::AgentSpawn, "AGENT_SPAWN"),
            (ClaudeEventType::AgentComplete, "AGENT_COMPLETE"),
            (ClaudeEventType::UserPrompt, "USER_PROMPT"),
            (ClaudeEventType::AgentThinking, "AGENT_THINKING"),
            (ClaudeEventType::AgentIdle, "AGENT_IDLE"),
            (ClaudeEventType::Notification, "NOTIFICATION"),
        ];
        for (kind, tag) in pairs {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{tag}\""));
        }
    }
}
