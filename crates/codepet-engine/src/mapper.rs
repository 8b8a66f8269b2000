//! Translation from wire events to game events.
//!
//! [`map_event`] is a pure function: same input, same output list, same
//! order, no hidden state. Event types outside the mapping table produce
//! an empty list, never an error.

use serde_json::Value;

use codepet_protocol::{Activity, ClaudeEvent, ClaudeEventType, GameEvent, ParticleEffect};

/// Fallback sub-agent flavor when the tool input does not name one.
pub const DEFAULT_AGENT_TYPE: &str = "general-purpose";

const DEFAULT_XP: u64 = 1;

/// What the pet does while a given tool runs.
pub fn tool_activity(tool: &str) -> Activity {
    match tool {
        "Read" => Activity::Reading,
        "Write" | "Edit" => Activity::Writing,
        "Grep" | "Glob" => Activity::Searching,
        "Bash" => Activity::Building,
        "Task" => Activity::Exploring,
        "WebFetch" | "WebSearch" => Activity::Communicating,
        _ => Activity::Building,
    }
}

/// XP (and matching token) award when a tool completes.
pub fn tool_xp(tool: &str) -> u64 {
    match tool {
        "Read" => 1,
        "Write" => 3,
        "Edit" => 2,
        "Grep" | "Glob" => 1,
        "Bash" => 2,
        "Task" => 5,
        "WebFetch" | "WebSearch" => 2,
        _ => DEFAULT_XP,
    }
}

pub fn tool_effect(tool: &str) -> ParticleEffect {
    match tool {
        "Read" => ParticleEffect::PageFlip,
        "Write" | "Edit" => ParticleEffect::Ink,
        "Grep" | "Glob" => ParticleEffect::Magnify,
        "Bash" => ParticleEffect::Hammer,
        "Task" => ParticleEffect::Portal,
        "WebFetch" | "WebSearch" => ParticleEffect::Signal,
        _ => ParticleEffect::Sparkle,
    }
}

/// Named waypoint the pet walks to for a tool.
pub fn tool_waypoint(tool: &str) -> &'static str {
    match tool {
        "Read" => "library",
        "Write" | "Edit" => "desk",
        "Grep" | "Glob" => "garden",
        "Bash" => "workshop",
        "Task" => "portal",
        "WebFetch" | "WebSearch" => "antenna",
        _ => "workshop",
    }
}

fn payload_str<'a>(payload: &'a Value, key: &str) -> Option<&'a str> {
    payload.get(key).and_then(Value::as_str)
}

fn spawn_agent_event(agent_id: &str, agent_type: Option<&str>, description: Option<&str>) -> GameEvent {
    GameEvent::SpawnAgent {
        agent_id: agent_id.to_owned(),
        agent_type: agent_type.unwrap_or(DEFAULT_AGENT_TYPE).to_owned(),
        description: description.map(str::to_owned),
    }
}

/// Map one wire event to the game events it implies, in order.
pub fn map_event(event: &ClaudeEvent) -> Vec<GameEvent> {
    let payload = &event.payload;
    match event.event_type {
        ClaudeEventType::ToolStart => {
            let tool = payload_str(payload, "tool_name").unwrap_or_default();
            let mut out = vec![
                GameEvent::ChangeActivity {
                    activity: tool_activity(tool),
                    tool_name: Some(tool.to_owned()),
                },
                GameEvent::SpawnParticles {
                    effect: tool_effect(tool),
                },
            ];
            // A Task tool call is a sub-agent birth; the tool_use_id is its
            // identity. Without one there is no stable key, so no spawn.
            if tool == "Task"
                && let Some(agent_id) = payload_str(payload, "tool_use_id")
            {
                out.push(spawn_agent_event(
                    agent_id,
                    payload.pointer("/tool_input/subagent_type").and_then(Value::as_str),
                    payload.pointer("/tool_input/description").and_then(Value::as_str),
                ));
            }
            out
        }
        ClaudeEventType::ToolComplete => {
            let tool = payload_str(payload, "tool_name").unwrap_or_default();
            let value = tool_xp(tool);
            vec![
                GameEvent::AwardResources {
                    xp: Some(value),
                    tokens: Some(value),
                    connections: None,
                    tool_name: Some(tool.to_owned()),
                },
                GameEvent::ChangeActivity {
                    activity: Activity::Idle,
                    tool_name: None,
                },
            ]
        }
        ClaudeEventType::AgentSpawn => match payload_str(payload, "agent_id") {
            Some(agent_id) => vec![spawn_agent_event(
                agent_id,
                payload_str(payload, "agent_type"),
                payload_str(payload, "description"),
            )],
            None => Vec::new(),
        },
        ClaudeEventType::AgentComplete => vec![
            GameEvent::RemoveAgent {
                agent_id: payload_str(payload, "agent_id").unwrap_or_default().to_owned(),
                success: payload.get("success").and_then(Value::as_bool).unwrap_or(true),
            },
            GameEvent::AwardResources {
                xp: None,
                tokens: None,
                connections: Some(1),
                tool_name: None,
            },
        ],
        ClaudeEventType::AgentIdle => vec![GameEvent::ChangeActivity {
            activity: Activity::Idle,
            tool_name: None,
        }],
        ClaudeEventType::SessionStart => vec![GameEvent::SessionStart {
            source: payload_str(payload, "source").map(str::to_owned),
        }],
        ClaudeEventType::SessionEnd => vec![GameEvent::SessionEnd],
        ClaudeEventType::UserPrompt => vec![GameEvent::ChangeActivity {
            activity: Activity::Thinking,
            tool_name: None,
        }],
        ClaudeEventType::AgentThinking | ClaudeEventType::Notification => Vec::new(),
    }
}
