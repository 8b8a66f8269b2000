//! Internal game-event vocabulary.
//!
//! `GameEvent`s are mutation commands produced by the event mapper and
//! consumed only by the engine. They never travel over the socket; the
//! serde derives exist for the applied-event feed and structured logs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What the pet is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    Idle,
    Thinking,
    Reading,
    Writing,
    Searching,
    Building,
    Exploring,
    Communicating,
    Resting,
    Celebrating,
}

impl Activity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Thinking => "thinking",
            Self::Reading => "reading",
            Self::Writing => "writing",
            Self::Searching => "searching",
            Self::Building => "building",
            Self::Exploring => "exploring",
            Self::Communicating => "communicating",
            Self::Resting => "resting",
            Self::Celebrating => "celebrating",
        }
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cosmetic burst the renderer draws when a tool fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticleEffect {
    Sparkle,
    PageFlip,
    Ink,
    Magnify,
    Hammer,
    Portal,
    Signal,
    Confetti,
}

/// Discriminated union of every mutation the engine accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameEvent {
    ChangeActivity {
        activity: Activity,
        #[serde(skip_serializing_if = "Option::is_none")]
        tool_name: Option<String>,
    },
    SpawnParticles {
        effect: ParticleEffect,
    },
    SpawnAgent {
        agent_id: String,
        agent_type: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    RemoveAgent {
        agent_id: String,
        success: bool,
    },
    AwardResources {
        #[serde(skip_serializing_if = "Option::is_none")]
        xp: Option<u64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        tokens: Option<u64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        connections: Option<u64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        tool_name: Option<String>,
    },
    SessionStart {
        #[serde(skip_serializing_if = "Option::is_none")]
        source: Option<String>,
    },
    SessionEnd,
    ApiUsage {
        input_tokens: u64,
        output_tokens: u64,
        cache_read_tokens: u64,
        cache_creation_tokens: u64,
    },
}
