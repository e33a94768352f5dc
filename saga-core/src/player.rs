//! The player aggregate: identity, stats, skills, inventory, and quest state.
//!
//! A player exclusively owns its CharacterStats, skill map, inventory, and
//! active quest arc. Nothing here is shared across players; the engine
//! assumes at most one in-flight turn per player id.

use crate::quest::QuestArc;
use crate::stats::CharacterStats;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Unique identifier for players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An inventory item. Quantities merge on add.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub quantity: u32,
}

impl Item {
    pub fn new(name: impl Into<String>, quantity: u32) -> Self {
        Self {
            name: name.into(),
            quantity,
        }
    }
}

/// A named skill with its own experience ladder.
///
/// Level only ever increases, and required experience for level L is linear
/// in L (see the progression module for the ladder).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    pub level: u8,
    pub experience: u32,
}

impl Skill {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level: 1,
            experience: 0,
        }
    }
}

/// A player character and everything it owns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub stats: CharacterStats,
    pub level: u8,
    pub experience: u32,
    pub skills: HashMap<String, Skill>,
    pub inventory: Vec<Item>,
    /// Number of turns processed for this player. Incremented exactly once
    /// per processed turn.
    pub turn: u32,
    pub quest: Option<QuestArc>,
}

impl Player {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: PlayerId::new(),
            name: name.into(),
            stats: CharacterStats::default(),
            level: 1,
            experience: 0,
            skills: HashMap::new(),
            inventory: Vec::new(),
            turn: 0,
            quest: None,
        }
    }

    pub fn with_stats(mut self, stats: CharacterStats) -> Self {
        self.stats = stats;
        self
    }

    pub fn with_quest(mut self, quest: QuestArc) -> Self {
        self.quest = Some(quest);
        self
    }

    /// Add items, merging quantities with an existing stack of the same name.
    pub fn add_item(&mut self, name: impl Into<String>, quantity: u32) {
        let name = name.into();
        if let Some(item) = self.inventory.iter_mut().find(|i| i.name == name) {
            item.quantity += quantity;
        } else {
            self.inventory.push(Item::new(name, quantity));
        }
    }

    /// Remove up to `quantity` items by name. Returns how many were removed.
    /// Empty stacks are dropped from the inventory.
    pub fn remove_item(&mut self, name: &str, quantity: u32) -> u32 {
        let Some(index) = self.inventory.iter().position(|i| i.name == name) else {
            return 0;
        };
        let item = &mut self.inventory[index];
        let removed = item.quantity.min(quantity);
        item.quantity -= removed;
        if item.quantity == 0 {
            self.inventory.remove(index);
        }
        removed
    }

    /// Total item count across all stacks. The equipment proxy for risk
    /// scoring.
    pub fn item_count(&self) -> u32 {
        self.inventory.iter().map(|i| i.quantity).sum()
    }

    /// Immutable summary handed to the narrative generator.
    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            name: self.name.clone(),
            level: self.level,
            turn: self.turn,
            health: (self.stats.health.current(), self.stats.health.maximum()),
            mana: (self.stats.mana.current(), self.stats.mana.maximum()),
            stamina: (self.stats.stamina.current(), self.stats.stamina.maximum()),
            quest_title: self.quest.as_ref().map(|q| q.title.clone()),
        }
    }
}

/// A point-in-time view of a player for narration. Never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub name: String,
    pub level: u8,
    pub turn: u32,
    pub health: (u32, u32),
    pub mana: (u32, u32),
    pub stamina: (u32, u32),
    pub quest_title: Option<String>,
}
