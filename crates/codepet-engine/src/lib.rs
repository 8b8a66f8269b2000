//! # codepet-engine — game state and simulation
//!
//! Owns the canonical [`GameState`] and everything that mutates it:
//! the pure [`mapper`] from wire events to game events, the
//! [`GameEngine`] that applies them, the periodic tick, and the
//! query/action surface the status CLI talks to.
//!
//! ## Module Overview
//!
//! - [`state`] — `GameState` and its sub-structures
//! - [`mapper`] — `map_event`: ClaudeEvent → ordered game events
//! - [`engine`] — `GameEngine`: apply, tick, feed, queries, actions
//! - [`skills`] — upgradeable skill book
//! - [`achievements`] — milestone table over progression counters

pub mod achievements;
pub mod engine;
pub mod mapper;
pub mod skills;
pub mod state;

pub use achievements::{AchievementLog, MILESTONES, Milestone};
pub use engine::GameEngine;
pub use mapper::map_event;
pub use skills::SkillBook;
pub use state::{GameState, MainAgent, Position, Progression, Resources, SubAgent};
