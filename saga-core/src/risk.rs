//! Encounter risk assessment.
//!
//! Scores an encounter's danger from a character snapshot plus encounter
//! metadata, producing a coarse risk tier, a success probability, and
//! threshold-based recommendations. Scoring is fully deterministic; all
//! tables are immutable configuration injected at construction. Unknown
//! category labels degrade to a documented default instead of failing.

use crate::player::Player;
use crate::progression::MAX_LEVEL;
use crate::quest::QuestDef;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Substitute danger/power weight for unknown or absent category labels.
pub const DEFAULT_CATEGORY_WEIGHT: f64 = 0.5;

/// Coarse risk tier driving narrative tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskTier {
    Calm,
    Mystery,
    Combat,
}

impl RiskTier {
    pub fn name(&self) -> &'static str {
        match self {
            RiskTier::Calm => "calm",
            RiskTier::Mystery => "mystery",
            RiskTier::Combat => "combat",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Encounter metadata fed into the assessment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Encounter {
    /// Location category label (table lookup, not free prose).
    pub location: String,
    /// Enemy category label, when the encounter has a known foe.
    pub enemy: Option<String>,
    pub objective_count: u32,
    pub recommended_level: u8,
}

impl Encounter {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            enemy: None,
            objective_count: 0,
            recommended_level: 1,
        }
    }

    pub fn with_enemy(mut self, enemy: impl Into<String>) -> Self {
        self.enemy = Some(enemy.into());
        self
    }

    pub fn with_objectives(mut self, count: u32) -> Self {
        self.objective_count = count;
        self
    }

    pub fn with_recommended_level(mut self, level: u8) -> Self {
        self.recommended_level = level;
        self
    }

    /// Derive encounter metadata from a catalog quest definition.
    pub fn from_quest(quest: &QuestDef) -> Self {
        Self {
            location: quest.location.clone(),
            enemy: quest.enemy.clone(),
            objective_count: quest.objectives.len() as u32,
            recommended_level: quest.recommended_level,
        }
    }
}

/// The assessment result. Immutable once returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub risk_score: f64,
    pub tier: RiskTier,
    pub success_probability: f64,
    pub recommendations: Vec<String>,
}

/// Fixed factor weights. The six weights sum to 1.0 in the default
/// configuration; absent factors substitute the default category weight
/// rather than triggering renormalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskWeights {
    pub level: f64,
    pub health: f64,
    pub equipment: f64,
    pub location: f64,
    pub enemy: f64,
    pub complexity: f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            level: 0.25,
            health: 0.20,
            equipment: 0.15,
            location: 0.15,
            enemy: 0.15,
            complexity: 0.10,
        }
    }
}

lazy_static::lazy_static! {
    /// Built-in danger weights per location category.
    static ref LOCATION_DANGER: Vec<(&'static str, f64)> = vec![
        ("village", 0.10),
        ("town", 0.15),
        ("tavern", 0.15),
        ("road", 0.30),
        ("forest", 0.45),
        ("swamp", 0.55),
        ("cave", 0.60),
        ("ruins", 0.65),
        ("dungeon", 0.80),
        ("crypt", 0.85),
        ("volcano", 0.90),
    ];

    /// Built-in strength weights per enemy category.
    static ref ENEMY_POWER: Vec<(&'static str, f64)> = vec![
        ("rat", 0.10),
        ("goblin", 0.30),
        ("bandit", 0.35),
        ("wolf", 0.40),
        ("cultist", 0.50),
        ("undead", 0.60),
        ("troll", 0.70),
        ("demon", 0.85),
        ("dragon", 0.95),
    ];
}

/// Immutable assessor configuration.
#[derive(Debug, Clone)]
pub struct RiskConfig {
    pub weights: RiskWeights,
    pub location_danger: HashMap<String, f64>,
    pub enemy_power: HashMap<String, f64>,
    /// Ordered (upper-bound, tier) table; scores above every bound map to
    /// the fallback tier.
    pub tier_thresholds: Vec<(f64, RiskTier)>,
    pub fallback_tier: RiskTier,
    /// Inventory size at which equipment is considered sufficient.
    pub expected_items: u32,
}

impl RiskConfig {
    /// Map a score to its tier through the ordered threshold table.
    pub fn tier_for(&self, score: f64) -> RiskTier {
        for (bound, tier) in &self.tier_thresholds {
            if score <= *bound {
                return *tier;
            }
        }
        self.fallback_tier
    }
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            weights: RiskWeights::default(),
            location_danger: LOCATION_DANGER
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
            enemy_power: ENEMY_POWER
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
            tier_thresholds: vec![(0.3, RiskTier::Calm), (0.7, RiskTier::Mystery)],
            fallback_tier: RiskTier::Combat,
            expected_items: 10,
        }
    }
}

/// Scores encounters against character snapshots.
#[derive(Debug, Clone, Default)]
pub struct RiskAssessor {
    config: RiskConfig,
}

impl RiskAssessor {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Assess an encounter. Deterministic: identical inputs always produce
    /// identical output.
    pub fn assess(&self, player: &Player, encounter: &Encounter) -> RiskAssessment {
        let level_gap = level_gap_factor(player.level, encounter.recommended_level);
        let health_deficit = 1.0 - player.stats.health.fraction();
        let equipment_fraction =
            (player.item_count() as f64 / self.config.expected_items.max(1) as f64).min(1.0);
        let equipment_deficit = 1.0 - equipment_fraction;
        let location_danger = self.location_danger(&encounter.location);
        let enemy_strength = self.enemy_strength(encounter.enemy.as_deref());
        let complexity = (encounter.objective_count as f64 / 5.0).min(1.0);

        let w = &self.config.weights;
        let risk_score = (w.level * level_gap
            + w.health * health_deficit
            + w.equipment * equipment_deficit
            + w.location * location_danger
            + w.enemy * enemy_strength
            + w.complexity * complexity)
            .clamp(0.0, 1.0);

        let tier = self.config.tier_for(risk_score);

        let level_norm = (player.level as f64 / MAX_LEVEL as f64).min(1.0);
        let player_power =
            0.5 * level_norm + 0.3 * player.stats.health.fraction() + 0.2 * equipment_fraction;
        let success_probability = success_probability(risk_score, player_power);

        // Fixed recommendation order: health, equipment, level, tier note.
        let mut recommendations = Vec::new();
        if health_deficit > 0.5 {
            recommendations
                .push("Your wounds run deep; restore your health before pressing on.".to_string());
        }
        if equipment_deficit > 0.6 {
            recommendations
                .push("Your pack is nearly empty; gather gear and supplies first.".to_string());
        }
        if level_gap > 0.7 {
            recommendations
                .push("This challenge is well beyond your level; expect a brutal fight.".to_string());
        }
        recommendations.push(
            match tier {
                RiskTier::Calm => "The way ahead looks quiet.",
                RiskTier::Mystery => "Something here does not add up; stay alert.",
                RiskTier::Combat => "Steel yourself; a fight is coming.",
            }
            .to_string(),
        );

        RiskAssessment {
            risk_score,
            tier,
            success_probability,
            recommendations,
        }
    }

    fn location_danger(&self, location: &str) -> f64 {
        match self.config.location_danger.get(location) {
            Some(danger) => *danger,
            None => {
                tracing::debug!(location, "unknown location category, using default danger");
                DEFAULT_CATEGORY_WEIGHT
            }
        }
    }

    fn enemy_strength(&self, enemy: Option<&str>) -> f64 {
        let Some(enemy) = enemy else {
            return DEFAULT_CATEGORY_WEIGHT;
        };
        match self.config.enemy_power.get(enemy) {
            Some(power) => *power,
            None => {
                tracing::debug!(enemy, "unknown enemy category, using default strength");
                DEFAULT_CATEGORY_WEIGHT
            }
        }
    }
}

/// Normalized level-gap factor. Equal levels sit at the neutral 0.5; five
/// levels above the character saturates at 1.0, five below at 0.0.
fn level_gap_factor(level: u8, recommended: u8) -> f64 {
    ((recommended as f64 - level as f64 + 5.0) / 10.0).clamp(0.0, 1.0)
}

fn success_probability(risk_score: f64, player_power: f64) -> f64 {
    (1.0 - risk_score + (player_power - 0.5) * 0.4).clamp(0.1, 0.9)
}
