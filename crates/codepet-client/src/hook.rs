//! Hook client: one CLI hook firing becomes one framed event.
//!
//! Failure discipline: the renderer may simply not be running, and a hook
//! must never error the host CLI because the visualization is absent.
//! Every transport failure is absorbed into [`SendOutcome`] and appended
//! to a side-channel log. Only an unrecognized hook type is a caller bug
//! and propagates.

use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use serde_json::{Map, Value, json};
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::net::UnixStream;
use tokio::time::timeout;
use tracing::debug;

use codepet_protocol::{ACK, ClaudeEvent, ClaudeEventType, hook_log_path};
use codepet_wire::write_frame;

use crate::{ClientError, STEP_TIMEOUT};

/// Hook callback points the host CLI exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    PreToolUse,
    PostToolUse,
    UserPromptSubmit,
    SessionStart,
    SessionEnd,
    Stop,
    SubagentStart,
    SubagentStop,
    Notification,
    PreCompact,
}

#[derive(Debug, Error)]
pub enum HookError {
    #[error("unknown hook type: {0}")]
    UnknownHook(String),
}

impl FromStr for HookKind {
    type Err = HookError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "PreToolUse" => Ok(Self::PreToolUse),
            "PostToolUse" => Ok(Self::PostToolUse),
            "UserPromptSubmit" => Ok(Self::UserPromptSubmit),
            "SessionStart" => Ok(Self::SessionStart),
            "SessionEnd" => Ok(Self::SessionEnd),
            "Stop" => Ok(Self::Stop),
            "SubagentStart" => Ok(Self::SubagentStart),
            "SubagentStop" => Ok(Self::SubagentStop),
            "Notification" => Ok(Self::Notification),
            "PreCompact" => Ok(Self::PreCompact),
            other => Err(HookError::UnknownHook(other.to_owned())),
        }
    }
}

/// Copy the named keys that are present; drop the rest of the hook blob
/// (transcript paths, cwd, and other fields the pet has no use for).
fn pick(payload: &Value, keys: &[&str]) -> Value {
    let mut out = Map::new();
    for key in keys {
        if let Some(value) = payload.get(*key) {
            out.insert((*key).to_owned(), value.clone());
        }
    }
    Value::Object(out)
}

/// Tool hooks need a stable id for sub-agent identity. The host CLI
/// usually provides one; fill in a UUID at the edge when it does not, so
/// the mapper never has to invent identifiers.
pub fn ensure_tool_use_id(kind: HookKind, payload: &mut Value) {
    if !matches!(kind, HookKind::PreToolUse | HookKind::PostToolUse) {
        return;
    }
    if let Some(object) = payload.as_object_mut()
        && !object
            .get("tool_use_id")
            .and_then(Value::as_str)
            .is_some_and(|id| !id.is_empty())
    {
        object.insert(
            "tool_use_id".to_owned(),
            Value::String(uuid::Uuid::new_v4().to_string()),
        );
    }
}

/// Deterministic, total construction of the wire event for one hook
/// firing.
pub fn build_event(kind: HookKind, payload: &Value, timestamp: f64) -> ClaudeEvent {
    let (event_type, fields) = match kind {
        HookKind::PreToolUse => (
            ClaudeEventType::ToolStart,
            pick(payload, &["tool_name", "tool_input", "tool_use_id"]),
        ),
        HookKind::PostToolUse => (
            ClaudeEventType::ToolComplete,
            pick(payload, &["tool_name", "tool_use_id"]),
        ),
        HookKind::UserPromptSubmit => {
            (ClaudeEventType::UserPrompt, pick(payload, &["prompt"]))
        }
        HookKind::SessionStart => {
            (ClaudeEventType::SessionStart, pick(payload, &["source"]))
        }
        HookKind::SessionEnd => (ClaudeEventType::SessionEnd, pick(payload, &["reason"])),
        HookKind::Stop => (ClaudeEventType::AgentIdle, json!({})),
        HookKind::SubagentStart => (
            ClaudeEventType::AgentSpawn,
            pick(payload, &["agent_id", "agent_type", "description"]),
        ),
        HookKind::SubagentStop => (
            ClaudeEventType::AgentComplete,
            pick(payload, &["agent_id", "success"]),
        ),
        HookKind::Notification => {
            (ClaudeEventType::Notification, pick(payload, &["message"]))
        }
        HookKind::PreCompact => (
            ClaudeEventType::Notification,
            json!({"message": "compacting context"}),
        ),
    };
    ClaudeEvent::new(event_type, timestamp, fields)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The daemon acked with `OK`.
    Delivered,
    /// No socket file: the renderer is not running. Not an error.
    NotRunning,
    /// Transport failure, absorbed. Details went to the side log.
    Failed,
}

/// Send one event. Never panics, never writes to stdout/stderr.
pub async fn send_event(socket: &Path, event: &ClaudeEvent) -> SendOutcome {
    if !socket.exists() {
        return SendOutcome::NotRunning;
    }
    match try_send(socket, event).await {
        Ok(()) => SendOutcome::Delivered,
        Err(error) => {
            log_swallowed(&error);
            SendOutcome::Failed
        }
    }
}

async fn try_send(socket: &Path, event: &ClaudeEvent) -> Result<(), ClientError> {
    let mut stream = timeout(STEP_TIMEOUT, UnixStream::connect(socket))
        .await
        .map_err(|_| ClientError::Timeout("connect"))??;

    let payload = serde_json::to_vec(event)?;
    timeout(STEP_TIMEOUT, write_frame(&mut stream, &payload))
        .await
        .map_err(|_| ClientError::Timeout("write"))??;

    // The event ack is exactly 2 raw bytes, no length prefix.
    let mut ack = [0u8; 2];
    timeout(STEP_TIMEOUT, stream.read_exact(&mut ack))
        .await
        .map_err(|_| ClientError::Timeout("ack"))??;
    if &ack != ACK {
        return Err(ClientError::UnexpectedAck(ack));
    }
    debug!("event acked");
    Ok(())
}

/// Best effort: one line per swallowed failure, never fatal itself.
fn log_swallowed(error: &ClientError) {
    let line = format!("{} {error}\n", chrono::Utc::now().to_rfc3339());
    if let Ok(mut file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(hook_log_path())
    {
        let _ = file.write_all(line.as_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn recognized_hook_names_parse() {
        for name in [
            "PreToolUse",
            "PostToolUse",
            "UserPromptSubmit",
            "SessionStart",
            "SessionEnd",
            "Stop",
            "SubagentStart",
            "SubagentStop",
            "Notification",
            "PreCompact",
        ] {
            assert!(HookKind::from_str(name).is_ok(), "{name} should parse");
        }
        assert!(matches!(
            HookKind::from_str("TotallyMadeUp"),
            Err(HookError::UnknownHook(name)) if name == "TotallyMadeUp"
        ));
    }

    #[test]
    fn pre_tool_use_builds_tool_start() {
        let payload = json!({
            "session_id": "s1",
            "tool_name": "Read",
            "tool_input": {"file_path": "/x.py"},
            "tool_use_id": "t1",
            "transcript_path": "/tmp/t.jsonl",
        });
        let event = build_event(HookKind::PreToolUse, &payload, 12.5);
        assert_eq!(event.event_type, ClaudeEventType::ToolStart);
        assert_eq!(event.timestamp, 12.5);
        assert_eq!(event.payload["tool_name"], "Read");
        assert_eq!(event.payload["tool_use_id"], "t1");
        // Hook noise must not leak onto the wire.
        assert!(event.payload.get("transcript_path").is_none());
    }

    #[test]
    fn lifecycle_hooks_map_to_expected_types() {
        let cases = [
            (HookKind::PostToolUse, ClaudeEventType::ToolComplete),
            (HookKind::UserPromptSubmit, ClaudeEventType::UserPrompt),
            (HookKind::SessionStart, ClaudeEventType::SessionStart),
            (HookKind::SessionEnd, ClaudeEventType::SessionEnd),
            (HookKind::Stop, ClaudeEventType::AgentIdle),
            (HookKind::SubagentStart, ClaudeEventType::AgentSpawn),
            (HookKind::SubagentStop, ClaudeEventType::AgentComplete),
            (HookKind::Notification, ClaudeEventType::Notification),
            (HookKind::PreCompact, ClaudeEventType::Notification),
        ];
        for (kind, expected) in cases {
            let event = build_event(kind, &json!({}), 0.0);
            assert_eq!(event.event_type, expected, "{kind:?}");
        }
    }

    #[test]
    fn build_event_is_deterministic() {
        let payload = json!({"tool_name": "Bash", "tool_use_id": "t2"});
        let a = build_event(HookKind::PreToolUse, &payload, 7.0);
        let b = build_event(HookKind::PreToolUse, &payload, 7.0);
        assert_eq!(a, b);
    }

    #[test]
    fn missing_tool_use_id_is_filled() {
        let mut payload = json!({"tool_name": "Task", "tool_input": {}});
        ensure_tool_use_id(HookKind::PreToolUse, &mut payload);
        let id = payload["tool_use_id"].as_str().unwrap();
        assert!(!id.is_empty());

        let mut present = json!({"tool_name": "Task", "tool_use_id": "keep-me"});
        ensure_tool_use_id(HookKind::PreToolUse, &mut present);
        assert_eq!(present["tool_use_id"], "keep-me");

        let mut other = json!({"prompt": "hi"});
        ensure_tool_use_id(HookKind::UserPromptSubmit, &mut other);
        assert!(other.get("tool_use_id").is_none());
    }

    #[tokio::test]
    async fn absent_socket_is_not_running() {
        let path = std::env::temp_dir().join("codepet-no-such-socket.sock");
        let event = build_event(HookKind::Stop, &json!({}), 0.0);
        assert_eq!(send_event(&path, &event).await, SendOutcome::NotRunning);
    }

    #[tokio::test]
    async fn delivered_on_ok_ack() {
        use codepet_wire::read_frame;
        use std::time::{SystemTime, UNIX_EPOCH};
        use tokio::io::AsyncWriteExt;

        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let path = std::env::temp_dir().join(format!("codepet-hook-ack-{nanos}.sock"));
        let listener = tokio::net::UnixListener::bind(&path).unwrap();
        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let frame = read_frame(&mut stream).await.unwrap().unwrap();
            let value: serde_json::Value = serde_json::from_slice(&frame).unwrap();
            assert_eq!(value["type"], "AGENT_IDLE");
            stream.write_all(b"OK").await.unwrap();
        });

        let event = build_event(HookKind::Stop, &json!({}), 1.0);
        assert_eq!(send_event(&path, &event).await, SendOutcome::Delivered);
        server.await.unwrap();
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn wrong_ack_bytes_fail_silently() {
        use codepet_wire::read_frame;
        use std::time::{SystemTime, UNIX_EPOCH};
        use tokio::io::AsyncWriteExt;

        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let path = std::env::temp_dir().join(format!("codepet-hook-badack-{nanos}.sock"));
        let listener = tokio::net::UnixListener::bind(&path).unwrap();
        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let _ = read_frame(&mut stream).await.unwrap();
            stream.write_all(b"NO").await.unwrap();
        });

        let event = build_event(HookKind::Stop, &json!({}), 1.0);
        assert_eq!(send_event(&path, &event).await, SendOutcome::Failed);
        server.await.unwrap();
        let _ = std::fs::remove_file(&path);
    }
}
