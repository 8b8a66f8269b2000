//! The game engine: applies game events to the canonical state.
//!
//! State transitions are driven solely by [`GameEvent`]s in the order the
//! mapper emitted them. Application is synchronous and happens under one
//! lock acquisition per dispatch, so no other task can observe a
//! half-applied event.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, info, warn};

use codepet_protocol::{Activity, ClaudeEvent, GameEvent, ParticleEffect};

use crate::mapper::{map_event, tool_waypoint};
use crate::state::{GameState, HOME_LOCATION, MAIN_AGENT_ID, SubAgent};

/// Seconds of uninterrupted idling before the pet lies down.
const REST_AFTER_SECS: f64 = 45.0;

/// How long the level-up flourish plays.
const CELEBRATE_SECS: f64 = 3.0;

const FEED_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct GameEngine {
    state: Arc<Mutex<GameState>>,
    feed: broadcast::Sender<GameEvent>,
}

impl GameEngine {
    /// Take ownership of the state built at startup. There is no global;
    /// tests construct as many engines as they like.
    pub fn new(state: GameState) -> Self {
        let (feed, _) = broadcast::channel(FEED_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(state)),
            feed,
        }
    }

    /// Run a closure against the current state under the lock.
    pub fn with_state<R>(&self, f: impl FnOnce(&GameState) -> R) -> R {
        f(&self.state.lock())
    }

    /// Applied-event feed for the renderer.
    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.feed.subscribe()
    }

    pub fn subscribe_stream(&self) -> BroadcastStream<GameEvent> {
        BroadcastStream::new(self.feed.subscribe())
    }

    /// The only entry point wire events use to mutate state: maps the
    /// event and applies the result in order, atomically.
    pub fn dispatch_claude_event(&self, event: &ClaudeEvent) {
        let events = map_event(event);
        if events.is_empty() {
            return;
        }
        {
            let mut state = self.state.lock();
            for game_event in &events {
                apply(&mut state, game_event);
            }
        }
        for game_event in events {
            let _ = self.feed.send(game_event);
        }
    }

    /// Apply a single game event. Used by tests and internal feeds.
    pub fn apply_event(&self, event: &GameEvent) {
        {
            let mut state = self.state.lock();
            apply(&mut state, event);
        }
        let _ = self.feed.send(event.clone());
    }

    /// Advance the simulation clock. Cosmetic state only; wire events
    /// always take precedence over anything the tick decides.
    pub fn update(&self, dt: f64) {
        let mut celebrate = false;
        {
            let mut state = self.state.lock();
            state.world_clock += dt;
            let agent = &mut state.main_agent;
            match agent.activity {
                Activity::Idle => {
                    if agent.pending_celebration {
                        agent.pending_celebration = false;
                        agent.flourish_secs = CELEBRATE_SECS;
                        agent.activity = Activity::Celebrating;
                        celebrate = true;
                    } else {
                        agent.idle_secs += dt;
                        if agent.idle_secs >= REST_AFTER_SECS {
                            agent.activity = Activity::Resting;
                        }
                    }
                }
                Activity::Celebrating => {
                    agent.flourish_secs -= dt;
                    if agent.flourish_secs <= 0.0 {
                        agent.activity = Activity::Idle;
                        agent.idle_secs = 0.0;
                    }
                }
                _ => {}
            }
        }
        if celebrate {
            let _ = self.feed.send(GameEvent::SpawnParticles {
                effect: ParticleEffect::Confetti,
            });
        }
    }

    // ─── Query surface ─────────────────────────────────────────────

    pub fn handle_query(&self, query: &str) -> Value {
        match query {
            "status" => self.status_report(),
            "skills" => self.skills_report(),
            "achievements" => self.achievements_report(),
            other => json!({"error": format!("unknown query: {other}")}),
        }
    }

    pub fn handle_action(&self, action: &str, data: &Value) -> Value {
        match action {
            "upgrade" => {
                let skill = data.get("skill").and_then(Value::as_str).unwrap_or_default();
                self.upgrade_skill(skill)
            }
            other => json!({
                "success": false,
                "message": format!("unknown action: {other}"),
            }),
        }
    }

    pub fn status_report(&self) -> Value {
        let state = self.state.lock();
        json!({
            "level": state.progression.level,
            "experience": state.progression.experience,
            "xp_to_next": state.progression.experience_to_next,
            "tokens": state.resources.tokens,
            "connections": state.resources.connections,
            "activity": state.main_agent.activity,
            "tools_used": state.progression.total_tools_used,
            "agents_spawned": state.progression.total_subagents_spawned,
            "time_of_day": state.time_of_day(),
        })
    }

    pub fn skills_report(&self) -> Value {
        let state = self.state.lock();
        json!({
            "skills": state.skills.levels(),
            "tokens": state.resources.tokens,
        })
    }

    pub fn achievements_report(&self) -> Value {
        let state = self.state.lock();
        let unlocked: Vec<Value> = crate::achievements::MILESTONES
            .iter()
            .filter(|milestone| state.achievements.is_unlocked(milestone.id))
            .map(|milestone| json!({"id": milestone.id, "title": milestone.title}))
            .collect();
        json!({
            "unlocked": unlocked,
            "unlocked_count": state.achievements.unlocked().len(),
            "total": crate::achievements::MILESTONES.len(),
        })
    }

    /// The `upgrade` action. Cost is `level * 50` tokens, deducted only
    /// on success.
    pub fn upgrade_skill(&self, skill: &str) -> Value {
        let mut state = self.state.lock();
        let Some(cost) = state.skills.upgrade_cost(skill) else {
            return json!({
                "success": false,
                "message": format!("unknown skill: {skill}"),
            });
        };
        if state.resources.tokens < cost {
            return json!({
                "success": false,
                "message": format!(
                    "{skill} costs {cost} tokens, only {} available",
                    state.resources.tokens
                ),
            });
        }
        state.resources.tokens -= cost;
        state.skills.raise(skill);
        let level = state.skills.level(skill).unwrap_or_default();
        info!(skill, level, cost, "skill upgraded");
        json!({
            "success": true,
            "message": format!("{skill} is now level {level}"),
        })
    }
}

fn apply(state: &mut GameState, event: &GameEvent) {
    match event {
        GameEvent::ChangeActivity {
            activity,
            tool_name,
        } => {
            let agent = &mut state.main_agent;
            agent.activity = *activity;
            agent.current_tool = tool_name.clone();
            agent.idle_secs = 0.0;
            if let Some(tool) = tool_name {
                agent.last_tool = Some(tool.clone());
                agent.last_tool_time = Some(Utc::now());
                let waypoint = tool_waypoint(tool);
                agent.walking = agent.current_location != waypoint;
                agent.current_location = waypoint.to_owned();
            }
            if *activity == Activity::Idle {
                agent.walking = agent.current_location != HOME_LOCATION;
                agent.current_location = HOME_LOCATION.to_owned();
            }
            debug!(activity = %activity, tool = ?tool_name, "activity changed");
        }
        GameEvent::SpawnParticles { effect } => {
            // Purely visual; the renderer picks this up from the feed.
            debug!(effect = ?effect, "particles requested");
        }
        GameEvent::SpawnAgent {
            agent_id,
            agent_type,
            description,
        } => {
            if agent_id == MAIN_AGENT_ID {
                warn!("refusing to shadow the main agent with a sub-agent");
                return;
            }
            let index = state.progression.total_subagents_spawned as usize;
            // Duplicate ids overwrite: last write wins.
            state.entities.insert(
                agent_id.clone(),
                SubAgent::new(agent_type.clone(), description.clone(), index),
            );
            state.progression.total_subagents_spawned += 1;
            unlock_milestones(state);
            debug!(agent_id, agent_type, "sub-agent spawned");
        }
        GameEvent::RemoveAgent { agent_id, success } => {
            // Absent ids are a no-op, not an error.
            if state.entities.shift_remove(agent_id).is_some() {
                debug!(agent_id, success, "sub-agent removed");
            }
        }
        GameEvent::AwardResources {
            xp,
            tokens,
            connections,
            tool_name,
        } => {
            if let Some(tokens) = tokens {
                state.resources.tokens += tokens;
            }
            if let Some(connections) = connections {
                state.resources.connections += connections;
            }
            if let Some(xp) = xp {
                award_xp(state, *xp);
            }
            if let Some(tool) = tool_name {
                state.progression.total_tools_used += 1;
                *state
                    .progression
                    .tool_usage
                    .entry(tool.clone())
                    .or_insert(0) += 1;
            }
            unlock_milestones(state);
        }
        GameEvent::SessionStart { source } => {
            state.session_active = true;
            info!(source = ?source, "session started");
        }
        GameEvent::SessionEnd => {
            state.session_active = false;
            info!("session ended");
        }
        GameEvent::ApiUsage {
            input_tokens,
            output_tokens,
            cache_read_tokens,
            cache_creation_tokens,
        } => {
            state.resources.api_costs.record(
                *input_tokens,
                *output_tokens,
                *cache_read_tokens,
                *cache_creation_tokens,
            );
        }
    }
}

/// Level-up rule. A single award crosses at most one level boundary,
/// however large the amount.
fn award_xp(state: &mut GameState, amount: u64) {
    let progression = &mut state.progression;
    progression.experience += amount;
    if progression.experience >= progression.experience_to_next {
        progression.level += 1;
        progression.experience -= progression.experience_to_next;
        // floor(x * 1.5) in integer arithmetic
        progression.experience_to_next = progression.experience_to_next * 3 / 2;
        state.main_agent.pending_celebration = true;
        info!(level = progression.level, "level up");
    }
}

fn unlock_milestones(state: &mut GameState) {
    for milestone in state.achievements.absorb(&state.progression) {
        info!(id = milestone.id, title = milestone.title, "achievement unlocked");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codepet_protocol::ClaudeEventType;
    use serde_json::json;

    fn engine() -> GameEngine {
        GameEngine::new(GameState::new())
    }

    fn claude(event_type: ClaudeEventType, payload: Value) -> ClaudeEvent {
        ClaudeEvent::new(event_type, 1.0, payload)
    }

    #[test]
    fn tool_start_then_complete_returns_to_idle() {
        let engine = engine();
        engine.dispatch_claude_event(&claude(
            ClaudeEventType::ToolStart,
            json!({"tool_name": "Read", "tool_input": {"file_path": "/x.py"}, "tool_use_id": "t1"}),
        ));
        engine.with_state(|state| {
            assert_eq!(state.main_agent.activity, Activity::Reading);
            assert_eq!(state.main_agent.current_tool.as_deref(), Some("Read"));
            assert_eq!(state.main_agent.current_location, "library");
        });

        engine.dispatch_claude_event(&claude(
            ClaudeEventType::ToolComplete,
            json!({"tool_name": "Read"}),
        ));
        engine.with_state(|state| {
            assert_eq!(state.main_agent.activity, Activity::Idle);
            assert_eq!(state.main_agent.current_tool, None);
            assert_eq!(state.main_agent.last_tool.as_deref(), Some("Read"));
            assert_eq!(state.main_agent.current_location, HOME_LOCATION);
            assert_eq!(state.progression.total_tools_used, 1);
            assert_eq!(state.progression.tool_usage["Read"], 1);
            assert!(state.progression.experience > 0);
        });
    }

    #[test]
    fn level_up_arithmetic() {
        let engine = engine();
        engine.apply_event(&GameEvent::AwardResources {
            xp: Some(150),
            tokens: None,
            connections: None,
            tool_name: None,
        });
        engine.with_state(|state| {
            assert_eq!(state.progression.level, 2);
            assert_eq!(state.progression.experience, 50);
            assert_eq!(state.progression.experience_to_next, 150);
        });
    }

    #[test]
    fn one_award_crosses_at_most_one_level() {
        let engine = engine();
        engine.apply_event(&GameEvent::AwardResources {
            xp: Some(1000),
            tokens: None,
            connections: None,
            tool_name: None,
        });
        engine.with_state(|state| {
            // 1000 xp clears level 1 only; the surplus waits for the
            // next award to trigger the next boundary check.
            assert_eq!(state.progression.level, 2);
            assert_eq!(state.progression.experience, 900);
            assert_eq!(state.progression.experience_to_next, 150);
        });
    }

    #[test]
    fn agent_lifecycle_and_double_remove() {
        let engine = engine();
        engine.apply_event(&GameEvent::SpawnAgent {
            agent_id: "a1".to_owned(),
            agent_type: "general-purpose".to_owned(),
            description: None,
        });
        engine.with_state(|state| {
            assert!(state.entities.contains_key("a1"));
            assert_eq!(state.progression.total_subagents_spawned, 1);
        });

        let remove = GameEvent::RemoveAgent {
            agent_id: "a1".to_owned(),
            success: true,
        };
        engine.apply_event(&remove);
        engine.apply_event(&remove); // absent id: no-op, no panic
        engine.with_state(|state| {
            assert!(!state.entities.contains_key("a1"));
            assert_eq!(state.progression.total_subagents_spawned, 1);
        });
    }

    #[test]
    fn duplicate_spawn_is_last_write_wins() {
        let engine = engine();
        for agent_type in ["first", "second"] {
            engine.apply_event(&GameEvent::SpawnAgent {
                agent_id: "dup".to_owned(),
                agent_type: agent_type.to_owned(),
                description: None,
            });
        }
        engine.with_state(|state| {
            assert_eq!(state.entities.len(), 1);
            assert_eq!(state.entities["dup"].agent_type, "second");
            assert_eq!(state.progression.total_subagents_spawned, 2);
        });
    }

    #[test]
    fn main_agent_id_never_enters_entities() {
        let engine = engine();
        engine.apply_event(&GameEvent::SpawnAgent {
            agent_id: MAIN_AGENT_ID.to_owned(),
            agent_type: "impostor".to_owned(),
            description: None,
        });
        engine.with_state(|state| {
            assert!(state.entities.is_empty());
            assert_eq!(state.progression.total_subagents_spawned, 0);
        });
    }

    #[test]
    fn session_flag_follows_events() {
        let engine = engine();
        engine.dispatch_claude_event(&claude(
            ClaudeEventType::SessionStart,
            json!({"source": "startup"}),
        ));
        engine.with_state(|state| assert!(state.session_active));
        engine.dispatch_claude_event(&claude(ClaudeEventType::SessionEnd, json!({})));
        engine.with_state(|state| assert!(!state.session_active));
    }

    #[test]
    fn api_usage_feeds_cost_accumulator() {
        let engine = engine();
        engine.apply_event(&GameEvent::ApiUsage {
            input_tokens: 2_000,
            output_tokens: 500,
            cache_read_tokens: 0,
            cache_creation_tokens: 0,
        });
        engine.with_state(|state| {
            assert_eq!(state.resources.api_costs.input_tokens, 2_000);
            assert!(state.resources.api_costs.cost_usd > 0.0);
        });
    }

    #[test]
    fn upgrade_deducts_only_on_success() {
        let engine = engine();
        let refused = engine.upgrade_skill("focus");
        assert_eq!(refused["success"], false);

        engine.apply_event(&GameEvent::AwardResources {
            xp: None,
            tokens: Some(60),
            connections: None,
            tool_name: None,
        });
        let upgraded = engine.upgrade_skill("focus");
        assert_eq!(upgraded["success"], true);
        engine.with_state(|state| {
            assert_eq!(state.skills.level("focus"), Some(2));
            assert_eq!(state.resources.tokens, 10);
        });

        let unknown = engine.upgrade_skill("juggling");
        assert_eq!(unknown["success"], false);
    }

    #[test]
    fn status_query_shape() {
        let engine = engine();
        let status = engine.handle_query("status");
        for key in [
            "level",
            "experience",
            "xp_to_next",
            "tokens",
            "connections",
            "activity",
            "tools_used",
            "agents_spawned",
            "time_of_day",
        ] {
            assert!(status.get(key).is_some(), "missing key {key}");
        }
        assert_eq!(status["activity"], "idle");

        let unknown = engine.handle_query("weather");
        assert!(unknown.get("error").is_some());
    }

    #[test]
    fn tick_promotes_celebration_then_settles() {
        let engine = engine();
        engine.apply_event(&GameEvent::AwardResources {
            xp: Some(150),
            tokens: None,
            connections: None,
            tool_name: None,
        });
        engine.update(0.1);
        engine.with_state(|state| {
            assert_eq!(state.main_agent.activity, Activity::Celebrating);
        });
        engine.update(CELEBRATE_SECS + 0.1);
        engine.with_state(|state| {
            assert_eq!(state.main_agent.activity, Activity::Idle);
        });
    }

    #[test]
    fn long_idle_drifts_to_resting_and_events_wake() {
        let engine = engine();
        engine.update(REST_AFTER_SECS + 1.0);
        engine.with_state(|state| {
            assert_eq!(state.main_agent.activity, Activity::Resting);
        });
        engine.dispatch_claude_event(&claude(
            ClaudeEventType::UserPrompt,
            json!({"prompt": "hello"}),
        ));
        engine.with_state(|state| {
            assert_eq!(state.main_agent.activity, Activity::Thinking);
        });
    }

    #[tokio::test]
    async fn feed_republishes_applied_events() {
        let engine = engine();
        let mut feed = engine.subscribe();
        engine.dispatch_claude_event(&claude(
            ClaudeEventType::ToolStart,
            json!({"tool_name": "Bash", "tool_use_id": "t3"}),
        ));
        let first = feed.recv().await.unwrap();
        assert!(matches!(first, GameEvent::ChangeActivity { .. }));
        let second = feed.recv().await.unwrap();
        assert!(matches!(second, GameEvent::SpawnParticles { .. }));
    }
}
