//! # codepet-client — ephemeral socket clients
//!
//! Two very different callers share this crate:
//!
//! - the **hook client** ([`hook`]), invoked once per CLI hook firing. It
//!   must never block or fail the host CLI, so every failure short of a
//!   caller bug is absorbed and logged to a side file.
//! - the **status client** ([`status`]), whose whole job is reporting to
//!   a human, so its failures surface loudly.

pub mod hook;
pub mod status;

use std::time::Duration;

use thiserror::Error;

use codepet_wire::FrameError;

/// Per-step budget: connect, write+drain, and the ack/response read are
/// each independently bounded.
pub const STEP_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("game not running (no socket file)")]
    NotRunning,
    #[error("timed out during {0}")]
    Timeout(&'static str),
    #[error("unexpected ack bytes {0:?}")]
    UnexpectedAck([u8; 2]),
    #[error("connection closed before a response arrived")]
    ClosedEarly,
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("bad response payload: {0}")]
    Decode(#[from] serde_json::Error),
}

pub use hook::{HookError, HookKind, SendOutcome, build_event, ensure_tool_use_id, send_event};
pub use status::StatusClient;
