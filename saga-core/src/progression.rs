//! Character and skill progression.
//!
//! Converts accumulated experience into levels, applies level-up stat
//! allocations under a fixed point budget, and advances skill ladders.
//! Over-allocation is rejected atomically: the character is left exactly as
//! it was and the caller is told the budget was exceeded.

use crate::player::Skill;
use crate::stats::{Attribute, CharacterStats, DerivedBonuses};
use std::collections::HashMap;
use thiserror::Error;

/// Highest character level the experience ladder reaches.
pub const MAX_LEVEL: u8 = 10;

/// A level-up's requested stat point distribution.
#[derive(Debug, Clone, Default)]
pub struct Allocation {
    points: HashMap<Attribute, u8>,
}

impl Allocation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, attribute: Attribute, points: u8) -> Self {
        *self.points.entry(attribute).or_insert(0) += points;
        self
    }

    pub fn total(&self) -> u8 {
        self.points.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (Attribute, u8)> + '_ {
        self.points.iter().map(|(a, p)| (*a, *p))
    }
}

/// A level-up allocation asked for more points than the budget allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("allocation of {requested} stat points exceeds the {budget}-point budget")]
pub struct AllocationExceeded {
    pub requested: u8,
    pub budget: u8,
}

/// Immutable progression configuration.
#[derive(Debug, Clone)]
pub struct ProgressionConfig {
    /// Total experience required to hold each level; index 0 is level 1.
    pub level_thresholds: Vec<u32>,
    /// Stat points granted per level-up.
    pub points_per_level: u8,
    pub max_skill_level: u8,
    /// Experience required to reach skill level L is L times this step.
    pub skill_experience_step: u32,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            level_thresholds: vec![0, 100, 300, 600, 1000, 1500, 2100, 2800, 3600, 4500],
            points_per_level: 2,
            max_skill_level: 10,
            skill_experience_step: 100,
        }
    }
}

/// Applies the experience ladder and level-up allocations.
#[derive(Debug, Clone, Default)]
pub struct ProgressionTracker {
    config: ProgressionConfig,
}

impl ProgressionTracker {
    pub fn new(config: ProgressionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProgressionConfig {
        &self.config
    }

    /// The level held at a given total experience. Monotonic in the input
    /// and capped at the top of the ladder.
    pub fn level_from_experience(&self, total_experience: u32) -> u8 {
        let mut level = 1u8;
        for (index, threshold) in self.config.level_thresholds.iter().enumerate() {
            if total_experience >= *threshold {
                level = (index + 1) as u8;
            } else {
                break;
            }
        }
        level.min(MAX_LEVEL)
    }

    /// Total experience required to hold `level`, if the ladder reaches it.
    pub fn experience_for_level(&self, level: u8) -> Option<u32> {
        if level == 0 {
            return None;
        }
        self.config.level_thresholds.get(level as usize - 1).copied()
    }

    /// Apply a level-up stat allocation.
    ///
    /// Rejects the whole allocation when it asks for more than the per-level
    /// budget; the stats are untouched in that case. On success the points
    /// are applied (clamped into the attribute range), derived bonuses are
    /// recomputed, and the fresh bonuses are returned.
    pub fn apply_level_up(
        &self,
        stats: &mut CharacterStats,
        allocation: &Allocation,
    ) -> Result<DerivedBonuses, AllocationExceeded> {
        let requested = allocation.total();
        if requested > self.config.points_per_level {
            return Err(AllocationExceeded {
                requested,
                budget: self.config.points_per_level,
            });
        }

        for (attribute, points) in allocation.iter() {
            stats.attributes.adjust(attribute, points as i8);
        }
        stats.recalculate();
        Ok(*stats.derived())
    }

    /// Grant skill experience, creating the skill at level 1 on first
    /// reference. Returns whether the skill leveled up.
    ///
    /// A single call advances at most one level: the threshold is checked
    /// once after the gain, so a gain large enough to cross two boundaries
    /// still only moves the skill one level.
    pub fn gain_skill_experience(
        &self,
        skills: &mut HashMap<String, Skill>,
        name: &str,
        amount: u32,
    ) -> bool {
        let skill = skills
            .entry(name.to_string())
            .or_insert_with(|| Skill::new(name));
        skill.experience += amount;

        if skill.level < self.config.max_skill_level
            && skill.experience >= self.skill_experience_required(skill.level + 1)
        {
            skill.level += 1;
            return true;
        }
        false
    }

    /// Experience required to reach a given skill level.
    pub fn skill_experience_required(&self, level: u8) -> u32 {
        level as u32 * self.config.skill_experience_step
    }

    /// Suggest a deterministic allocation: spend the budget one point at a
    /// time on the currently-lowest attribute, ties broken in declaration
    /// order.
    pub fn suggest_allocation(&self, stats: &CharacterStats) -> Allocation {
        let mut scores = stats.attributes.clone();
        let mut allocation = Allocation::new();
        for _ in 0..self.config.points_per_level {
            let lowest = Attribute::all()
                .into_iter()
                .filter(|a| scores.get(*a) < crate::stats::ATTRIBUTE_MAX)
                .min_by_key(|a| scores.get(*a));
            let Some(attribute) = lowest else { break };
            scores.adjust(attribute, 1);
            allocation = allocation.with(attribute, 1);
        }
        allocation
    }
}
