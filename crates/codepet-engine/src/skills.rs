//! Upgradeable skill book.
//!
//! A fixed set of skills, each starting at level 1. Raising a skill costs
//! `current_level * 50` tokens, deducted only when the upgrade succeeds.

use indexmap::IndexMap;
use serde::Serialize;

pub const UPGRADE_COST_PER_LEVEL: u64 = 50;

const STARTER_SKILLS: [&str; 4] = ["agility", "focus", "stamina", "charm"];

#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct SkillBook {
    levels: IndexMap<String, u32>,
}

impl SkillBook {
    pub fn new() -> Self {
        let levels = STARTER_SKILLS
            .iter()
            .map(|name| ((*name).to_owned(), 1))
            .collect();
        Self { levels }
    }

    pub fn level(&self, skill: &str) -> Option<u32> {
        self.levels.get(skill).copied()
    }

    /// Token cost of the next level, or `None` for an unknown skill.
    pub fn upgrade_cost(&self, skill: &str) -> Option<u64> {
        self.level(skill)
            .map(|level| u64::from(level) * UPGRADE_COST_PER_LEVEL)
    }

    /// Raise a known skill by one level. Callers check cost first.
    pub fn raise(&mut self, skill: &str) {
        if let Some(level) = self.levels.get_mut(skill) {
            *level += 1;
        }
    }

    pub fn levels(&self) -> &IndexMap<String, u32> {
        &self.levels
    }
}

impl Default for SkillBook {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starter_skills_begin_at_level_one() {
        let book = SkillBook::new();
        for skill in STARTER_SKILLS {
            assert_eq!(book.level(skill), Some(1));
            assert_eq!(book.upgrade_cost(skill), Some(UPGRADE_COST_PER_LEVEL));
        }
    }

    #[test]
    fn cost_scales_with_level() {
        let mut book = SkillBook::new();
        book.raise("focus");
        book.raise("focus");
        assert_eq!(book.level("focus"), Some(3));
        assert_eq!(book.upgrade_cost("focus"), Some(150));
    }

    #[test]
    fn unknown_skill_has_no_cost() {
        let mut book = SkillBook::new();
        assert_eq!(book.upgrade_cost("juggling"), None);
        book.raise("juggling");
        assert_eq!(book.level("juggling"), None);
    }
}
