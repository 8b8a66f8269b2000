//! # codepet-protocol — wire and game-event taxonomy
//!
//! Shared types for everything that crosses the codepet socket, plus the
//! internal game-event vocabulary the engine consumes.
//!
//! It is intentionally dependency-light (no runtime deps like tokio) so it
//! can be used as a pure contract crate by clients and the daemon alike.
//!
//! ## Module Overview
//!
//! - [`event`] — `ClaudeEvent` + `ClaudeEventType` (closed enum with a
//!   `NOTIFICATION` catch-all for unknown type tags)
//! - [`message`] — wire-message classification (QUERY / ACTION / event)
//!   and the raw reply byte constants
//! - [`game`] — `GameEvent`, `Activity`, `ParticleEffect`
//! - [`socket`] — well-known socket and side-log path resolution

pub mod event;
pub mod game;
pub mod message;
pub mod socket;

pub use event::{ClaudeEvent, ClaudeEventType};
pub use game::{Activity, GameEvent, ParticleEffect};
pub use message::{ACK, ERR, MAX_FRAME_LEN, WireMessage};
pub use socket::{hook_log_path, socket_path};
