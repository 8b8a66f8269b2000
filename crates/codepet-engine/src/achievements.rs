//! Milestone table over progression counters.

use serde::Serialize;

use crate::state::Progression;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Counter {
    ToolsUsed,
    SubagentsSpawned,
    Level,
}

#[derive(Debug, Clone, Copy)]
pub struct Milestone {
    pub id: &'static str,
    pub title: &'static str,
    counter: Counter,
    goal: u64,
}

impl Milestone {
    pub fn reached(&self, progression: &Progression) -> bool {
        let value = match self.counter {
            Counter::ToolsUsed => progression.total_tools_used,
            Counter::SubagentsSpawned => progression.total_subagents_spawned,
            Counter::Level => u64::from(progression.level),
        };
        value >= self.goal
    }
}

pub const MILESTONES: &[Milestone] = &[
    Milestone {
        id: "first_steps",
        title: "First Steps",
        counter: Counter::ToolsUsed,
        goal: 1,
    },
    Milestone {
        id: "busy_paws",
        title: "Busy Paws",
        counter: Counter::ToolsUsed,
        goal: 25,
    },
    Milestone {
        id: "tool_master",
        title: "Tool Master",
        counter: Counter::ToolsUsed,
        goal: 100,
    },
    Milestone {
        id: "level_5",
        title: "Growing Up",
        counter: Counter::Level,
        goal: 5,
    },
    Milestone {
        id: "level_10",
        title: "Seasoned Explorer",
        counter: Counter::Level,
        goal: 10,
    },
    Milestone {
        id: "first_friend",
        title: "First Friend",
        counter: Counter::SubagentsSpawned,
        goal: 1,
    },
    Milestone {
        id: "pack_leader",
        title: "Pack Leader",
        counter: Counter::SubagentsSpawned,
        goal: 10,
    },
];

/// Which milestones have been unlocked, in unlock order.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct AchievementLog {
    unlocked: Vec<&'static str>,
}

impl AchievementLog {
    pub fn is_unlocked(&self, id: &str) -> bool {
        self.unlocked.iter().any(|unlocked| *unlocked == id)
    }

    pub fn unlocked(&self) -> &[&'static str] {
        &self.unlocked
    }

    /// Record every newly reached milestone; returns the new unlocks.
    pub fn absorb(&mut self, progression: &Progression) -> Vec<&'static Milestone> {
        let mut fresh = Vec::new();
        for milestone in MILESTONES {
            if !self.is_unlocked(milestone.id) && milestone.reached(progression) {
                self.unlocked.push(milestone.id);
                fresh.push(milestone);
            }
        }
        fresh
    }
}
