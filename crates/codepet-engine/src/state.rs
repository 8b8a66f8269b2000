//! Canonical game state.
//!
//! A single `GameState` instance exists per daemon process. It is created
//! once at startup, handed to the [`GameEngine`](crate::engine::GameEngine)
//! by value, and mutated in place for the process lifetime. Nothing
//! survives a restart.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;

use codepet_protocol::Activity;

use crate::achievements::AchievementLog;
use crate::skills::SkillBook;

/// Reserved id for the main pet; never a key in [`GameState::entities`].
pub const MAIN_AGENT_ID: &str = "main_agent";

/// Waypoint the pet returns to when idle.
pub const HOME_LOCATION: &str = "center";

/// Seconds of game time in one full day cycle.
pub const DAY_LENGTH_SECS: f64 = 600.0;

/// USD per input/output/cache token, at per-million rates.
const USD_PER_INPUT_TOKEN: f64 = 3.0 / 1_000_000.0;
const USD_PER_OUTPUT_TOKEN: f64 = 15.0 / 1_000_000.0;
const USD_PER_CACHE_READ_TOKEN: f64 = 0.30 / 1_000_000.0;
const USD_PER_CACHE_CREATION_TOKEN: f64 = 3.75 / 1_000_000.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

/// The pet itself.
#[derive(Debug, Clone, Serialize)]
pub struct MainAgent {
    pub activity: Activity,
    pub current_tool: Option<String>,
    pub last_tool: Option<String>,
    pub last_tool_time: Option<DateTime<Utc>>,
    pub position: Position,
    pub target: Position,
    pub walking: bool,
    pub current_location: String,
    #[serde(skip)]
    pub(crate) idle_secs: f64,
    #[serde(skip)]
    pub(crate) flourish_secs: f64,
    #[serde(skip)]
    pub(crate) pending_celebration: bool,
}

impl Default for MainAgent {
    fn default() -> Self {
        Self {
            activity: Activity::Idle,
            current_tool: None,
            last_tool: None,
            last_tool_time: None,
            position: Position::default(),
            target: Position::default(),
            walking: false,
            current_location: HOME_LOCATION.to_owned(),
            idle_secs: 0.0,
            flourish_secs: 0.0,
            pending_celebration: false,
        }
    }
}

/// A spawned sub-agent companion.
#[derive(Debug, Clone, Serialize)]
pub struct SubAgent {
    #[serde(rename = "type")]
    pub entity_type: &'static str,
    pub agent_type: String,
    pub activity: Activity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub position: Position,
}

impl SubAgent {
    pub fn new(agent_type: String, description: Option<String>, index: usize) -> Self {
        // Companions fan out to the pet's left, one slot per spawn order.
        let slot = (index % 6) as f32;
        Self {
            entity_type: "sub_agent",
            agent_type,
            activity: Activity::Exploring,
            description,
            position: Position {
                x: -2.0 - slot * 1.5,
                y: 1.0,
            },
        }
    }
}

/// Token-count accumulator with a derived USD figure.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ApiCosts {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_read_tokens: u64,
    pub cache_creation_tokens: u64,
    pub cost_usd: f64,
}

impl ApiCosts {
    pub fn record(
        &mut self,
        input_tokens: u64,
        output_tokens: u64,
        cache_read_tokens: u64,
        cache_creation_tokens: u64,
    ) {
        self.input_tokens += input_tokens;
        self.output_tokens += output_tokens;
        self.cache_read_tokens += cache_read_tokens;
        self.cache_creation_tokens += cache_creation_tokens;
        self.cost_usd += input_tokens as f64 * USD_PER_INPUT_TOKEN
            + output_tokens as f64 * USD_PER_OUTPUT_TOKEN
            + cache_read_tokens as f64 * USD_PER_CACHE_READ_TOKEN
            + cache_creation_tokens as f64 * USD_PER_CACHE_CREATION_TOKEN;
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Resources {
    pub tokens: u64,
    pub connections: u64,
    pub api_costs: ApiCosts,
}

#[derive(Debug, Clone, Serialize)]
pub struct Progression {
    pub level: u32,
    pub experience: u64,
    pub experience_to_next: u64,
    pub total_tools_used: u64,
    pub total_subagents_spawned: u64,
    pub tool_usage: IndexMap<String, u64>,
}

impl Default for Progression {
    fn default() -> Self {
        Self {
            level: 1,
            experience: 0,
            experience_to_next: 100,
            total_tools_used: 0,
            total_subagents_spawned: 0,
            tool_usage: IndexMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GameState {
    pub main_agent: MainAgent,
    pub entities: IndexMap<String, SubAgent>,
    pub resources: Resources,
    pub progression: Progression,
    pub skills: SkillBook,
    pub achievements: AchievementLog,
    pub session_active: bool,
    /// Accumulated game-time seconds; drives the day/night cycle.
    pub world_clock: f64,
}

impl GameState {
    pub fn new() -> Self {
        Self {
            main_agent: MainAgent::default(),
            entities: IndexMap::new(),
            resources: Resources::default(),
            progression: Progression::default(),
            skills: SkillBook::new(),
            achievements: AchievementLog::default(),
            session_active: false,
            world_clock: 0.0,
        }
    }

    /// Named phase of the day cycle, for the status surface and renderer.
    pub fn time_of_day(&self) -> &'static str {
        let fraction = (self.world_clock / DAY_LENGTH_SECS).fract();
        if fraction < 0.1 {
            "dawn"
        } else if fraction < 0.5 {
            "day"
        } else if fraction < 0.6 {
            "dusk"
        } else {
            "night"
        }
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}
