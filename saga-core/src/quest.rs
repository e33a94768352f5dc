//! Quest arcs and the read-only quest catalog.
//!
//! A quest arc is a multi-act, multi-turn structured objective owned by one
//! player. The catalog is an external lookup of quest definitions used as
//! encounter metadata for risk assessment; this crate ships an in-memory
//! implementation for embedding and tests.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Unique identifier for quest definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuestId(pub Uuid);

impl QuestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for QuestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for QuestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A quest definition from the catalog.
///
/// The location and enemy fields are coarse category labels consumed by the
/// risk tables; unknown labels degrade to a documented default there.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestDef {
    pub id: QuestId,
    pub title: String,
    pub description: String,
    pub objectives: Vec<String>,
    pub tags: Vec<String>,
    pub location: String,
    pub enemy: Option<String>,
    pub recommended_level: u8,
    pub reward: String,
}

impl QuestDef {
    pub fn new(title: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            id: QuestId::new(),
            title: title.into(),
            description: String::new(),
            objectives: Vec::new(),
            tags: Vec::new(),
            location: location.into(),
            enemy: None,
            recommended_level: 1,
            reward: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_objective(mut self, objective: impl Into<String>) -> Self {
        self.objectives.push(objective.into());
        self
    }

    pub fn with_enemy(mut self, enemy: impl Into<String>) -> Self {
        self.enemy = Some(enemy.into());
        self
    }

    pub fn with_recommended_level(mut self, level: u8) -> Self {
        self.recommended_level = level;
        self
    }

    pub fn with_reward(mut self, reward: impl Into<String>) -> Self {
        self.reward = reward.into();
        self
    }
}

/// Read-only lookup of quest definitions.
pub trait QuestCatalog {
    fn get(&self, id: QuestId) -> Option<&QuestDef>;
}

/// In-memory quest catalog.
#[derive(Debug, Clone, Default)]
pub struct InMemoryQuestCatalog {
    quests: HashMap<QuestId, QuestDef>,
}

impl InMemoryQuestCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, quest: QuestDef) -> QuestId {
        let id = quest.id;
        self.quests.insert(id, quest);
        id
    }

    pub fn len(&self) -> usize {
        self.quests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quests.is_empty()
    }
}

impl QuestCatalog for InMemoryQuestCatalog {
    fn get(&self, id: QuestId) -> Option<&QuestDef> {
        self.quests.get(&id)
    }
}

/// A milestone checkpoint within an active arc.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Milestone {
    pub act: u8,
    pub turn: u32,
    pub event: String,
}

/// A player's active multi-act quest.
///
/// `current_act` is monotonically non-decreasing and `turn_count` increases
/// by exactly one per processed turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestArc {
    pub title: String,
    pub description: String,
    pub current_act: u8,
    pub total_acts: u8,
    pub turn_count: u32,
    pub milestones: Vec<Milestone>,
}

impl QuestArc {
    pub fn new(title: impl Into<String>, description: impl Into<String>, total_acts: u8) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            current_act: 1,
            total_acts: total_acts.max(1),
            turn_count: 0,
            milestones: Vec::new(),
        }
    }

    /// Count one processed turn toward this arc.
    pub fn record_turn(&mut self) {
        self.turn_count += 1;
    }

    /// Advance to the next act, recording a milestone. Returns false when
    /// already in the final act; the act counter never moves backwards.
    pub fn advance_act(&mut self, event: impl Into<String>) -> bool {
        if self.current_act >= self.total_acts {
            return false;
        }
        self.current_act += 1;
        self.milestones.push(Milestone {
            act: self.current_act,
            turn: self.turn_count,
            event: event.into(),
        });
        true
    }

    pub fn is_final_act(&self) -> bool {
        self.current_act >= self.total_acts
    }
}
