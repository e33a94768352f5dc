//! Delayed consequences: "in N turns, trigger event E".
//!
//! Each player owns an independent pending queue. Entries fire at most once:
//! advancing past a trigger turn marks the entry fired, and repeated calls
//! with the same or a later turn never return it again. Scheduling into the
//! past is accepted (the entry fires on the next advance) with a soft
//! warning rather than an error.

use crate::player::PlayerId;
use crate::turn::TurnEffect;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a scheduled consequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConsequenceId(Uuid);

impl ConsequenceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConsequenceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConsequenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a scheduled consequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsequenceStatus {
    /// Waiting for its trigger turn.
    Pending,
    /// Fired exactly once; will never fire again.
    Fired,
    /// Withdrawn before firing.
    Cancelled,
}

/// A delayed effect scheduled to fire no earlier than its trigger turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsequenceEntry {
    pub id: ConsequenceId,
    pub trigger_turn: u32,
    /// Free-form event label handed to the narrator when this fires.
    pub event: String,
    pub description: String,
    /// Concrete stat/inventory deltas applied when this fires.
    pub effects: Vec<TurnEffect>,
    pub status: ConsequenceStatus,
    /// Insertion sequence, used to break trigger-turn ties
    /// (first scheduled fires first).
    seq: u64,
}

impl ConsequenceEntry {
    pub fn is_pending(&self) -> bool {
        self.status == ConsequenceStatus::Pending
    }

    pub fn is_fired(&self) -> bool {
        self.status == ConsequenceStatus::Fired
    }
}

/// Per-player queues of pending consequences.
#[derive(Debug, Clone, Default)]
pub struct ConsequenceScheduler {
    pending: HashMap<PlayerId, Vec<ConsequenceEntry>>,
    /// Last turn each player advanced to, for late-schedule detection.
    last_advanced: HashMap<PlayerId, u32>,
    next_seq: u64,
}

impl ConsequenceScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a consequence for a player.
    ///
    /// A trigger turn at or before the player's current turn is accepted and
    /// will fire on the next advance; it is logged as a soft warning, never
    /// rejected.
    pub fn schedule(
        &mut self,
        player: PlayerId,
        trigger_turn: u32,
        event: impl Into<String>,
        description: impl Into<String>,
        effects: Vec<TurnEffect>,
    ) -> ConsequenceId {
        if let Some(current) = self.last_advanced.get(&player) {
            if trigger_turn < *current {
                tracing::warn!(
                    %player,
                    trigger_turn,
                    current_turn = *current,
                    "consequence scheduled in the past; it will fire on the next turn"
                );
            }
        }

        let entry = ConsequenceEntry {
            id: ConsequenceId::new(),
            trigger_turn,
            event: event.into(),
            description: description.into(),
            effects,
            status: ConsequenceStatus::Pending,
            seq: self.next_seq,
        };
        self.next_seq += 1;

        let id = entry.id;
        self.pending.entry(player).or_default().push(entry);
        id
    }

    /// Fire every pending entry whose trigger turn has been reached.
    ///
    /// Returned entries are ordered by ascending trigger turn, ties broken
    /// by insertion order. Firing is idempotent: an entry returned once is
    /// never returned again, no matter how often this is called.
    pub fn advance_turn(&mut self, player: PlayerId, current_turn: u32) -> Vec<ConsequenceEntry> {
        self.last_advanced.insert(player, current_turn);

        let Some(entries) = self.pending.get_mut(&player) else {
            return Vec::new();
        };

        let mut fired: Vec<ConsequenceEntry> = Vec::new();
        for entry in entries.iter_mut() {
            if entry.is_pending() && entry.trigger_turn <= current_turn {
                entry.status = ConsequenceStatus::Fired;
                fired.push(entry.clone());
            }
        }
        fired.sort_by_key(|e| (e.trigger_turn, e.seq));
        fired
    }

    /// Withdraw a pending consequence without firing it.
    pub fn cancel(&mut self, player: PlayerId, id: ConsequenceId) -> bool {
        let Some(entries) = self.pending.get_mut(&player) else {
            return false;
        };
        match entries.iter_mut().find(|e| e.id == id && e.is_pending()) {
            Some(entry) => {
                entry.status = ConsequenceStatus::Cancelled;
                true
            }
            None => false,
        }
    }

    /// Pending entries for a player, in insertion order.
    pub fn pending_for(&self, player: PlayerId) -> Vec<&ConsequenceEntry> {
        self.pending
            .get(&player)
            .map(|entries| entries.iter().filter(|e| e.is_pending()).collect())
            .unwrap_or_default()
    }

    pub fn pending_count(&self, player: PlayerId) -> usize {
        self.pending_for(player).len()
    }

    /// Drop fired and cancelled entries for a player.
    pub fn prune(&mut self, player: PlayerId) {
        if let Some(entries) = self.pending.get_mut(&player) {
            entries.retain(|e| e.is_pending());
        }
    }

    /// Export a player's pending entries for persistence.
    pub fn export_pending(&self, player: PlayerId) -> Vec<ConsequenceEntry> {
        self.pending
            .get(&player)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|e| e.is_pending())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Restore a player's pending entries from a save, replacing any queue
    /// already present for that player.
    pub fn restore(&mut self, player: PlayerId, entries: Vec<ConsequenceEntry>) {
        for entry in &entries {
            self.next_seq = self.next_seq.max(entry.seq + 1);
        }
        self.pending.insert(player, entries);
    }
}
