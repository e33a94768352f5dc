//! GameSession - the primary public API for running an adventure.
//!
//! Wraps the orchestrator, progression tracker, quest catalog, and an
//! external narrator behind a single interface. Turn state is committed
//! before narration is requested, so a narrator failure degrades the prose
//! but never the gameplay state.

use crate::consequence::{ConsequenceEntry, ConsequenceId};
use crate::narrator::{Narration, Narrator};
use crate::persist::{PersistError, SavedGame};
use crate::player::Player;
use crate::progression::{Allocation, AllocationExceeded, ProgressionConfig, ProgressionTracker};
use crate::quest::{InMemoryQuestCatalog, QuestArc, QuestDef, QuestId};
use crate::risk::{RiskAssessor, RiskConfig, RiskTier};
use crate::stats::DerivedBonuses;
use crate::turn::{OutcomeRoll, PlayerAction, TurnEffect, TurnOrchestrator};
use std::path::Path;
use thiserror::Error;

/// Errors from GameSession operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("persistence error: {0}")]
    Persist(#[from] PersistError),
}

/// Configuration for creating a new game session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Player character name.
    pub player_name: String,

    /// Risk assessment tables and weights.
    pub risk: RiskConfig,

    /// Experience ladder and allocation budget.
    pub progression: ProgressionConfig,

    /// Optional starting quest arc.
    pub quest: Option<QuestArc>,
}

impl SessionConfig {
    pub fn new(player_name: impl Into<String>) -> Self {
        Self {
            player_name: player_name.into(),
            risk: RiskConfig::default(),
            progression: ProgressionConfig::default(),
            quest: None,
        }
    }

    pub fn with_risk(mut self, risk: RiskConfig) -> Self {
        self.risk = risk;
        self
    }

    pub fn with_progression(mut self, progression: ProgressionConfig) -> Self {
        self.progression = progression;
        self
    }

    pub fn with_quest(mut self, quest: QuestArc) -> Self {
        self.quest = Some(quest);
        self
    }
}

/// Response from a player action.
#[derive(Debug, Clone)]
pub struct Response {
    /// The narrative text for this turn.
    pub narrative: String,

    /// The player's next choices (2 to 4 of them).
    pub choices: Vec<String>,

    /// Risk tier of the assessed encounter, when the action implied one.
    pub risk_tier: Option<RiskTier>,

    /// The sampled outcome of the assessed action.
    pub outcome: Option<OutcomeRoll>,

    /// Deltas applied to the player this turn.
    pub effects: Vec<TurnEffect>,

    /// Consequences that fired this turn.
    pub fired_consequences: Vec<ConsequenceEntry>,

    /// Generator metadata passed through verbatim.
    pub metadata: std::collections::HashMap<String, String>,

    /// True when the narrator failed and the fallback narration was used.
    pub degraded: bool,
}

/// A running game for one player.
pub struct GameSession<N: Narrator> {
    narrator: N,
    orchestrator: TurnOrchestrator,
    progression: ProgressionTracker,
    catalog: InMemoryQuestCatalog,
    player: Player,
}

impl<N: Narrator> GameSession<N> {
    /// Create a new session with the given configuration and narrator.
    pub fn new(config: SessionConfig, narrator: N) -> Self {
        let mut player = Player::new(config.player_name);
        player.quest = config.quest;

        Self {
            narrator,
            orchestrator: TurnOrchestrator::new(RiskAssessor::new(config.risk)),
            progression: ProgressionTracker::new(config.progression),
            catalog: InMemoryQuestCatalog::new(),
            player,
        }
    }

    /// Process a player action and narrate the result.
    ///
    /// This is the main gameplay loop entry point. Turn state is fully
    /// committed before narration is attempted; a narrator failure or
    /// malformed output yields the fallback narration with `degraded` set.
    pub async fn player_action(&mut self, action: PlayerAction) -> Response {
        let result = self
            .orchestrator
            .process_turn(&mut self.player, &action, &self.catalog);

        let (narration, degraded) = match self.narrator.narrate(&result.narration_request).await {
            Ok(narration) => {
                let narration = narration.normalize();
                if narration.is_well_formed() {
                    (narration, false)
                } else {
                    tracing::warn!("narrator returned malformed output, using fallback");
                    (Narration::fallback(&result.narration_request), true)
                }
            }
            Err(error) => {
                tracing::warn!(%error, "narrator failed, using fallback");
                (Narration::fallback(&result.narration_request), true)
            }
        };

        Response {
            narrative: narration.narrative,
            choices: narration.choices,
            risk_tier: result.narration_request.risk_tier,
            outcome: result.narration_request.outcome,
            effects: result.applied_effects,
            fired_consequences: result.fired_consequences,
            metadata: narration.metadata,
            degraded,
        }
    }

    /// Shorthand for a plain text action with no encounter.
    pub async fn act(&mut self, text: &str) -> Response {
        self.player_action(PlayerAction::new(text)).await
    }

    /// Schedule a consequence to fire `delay` turns from now.
    pub fn schedule_consequence(
        &mut self,
        delay: u32,
        event: impl Into<String>,
        description: impl Into<String>,
        effects: Vec<TurnEffect>,
    ) -> ConsequenceId {
        self.orchestrator
            .schedule_in(&self.player, delay, event, description, effects)
    }

    /// Withdraw a pending consequence.
    pub fn cancel_consequence(&mut self, id: ConsequenceId) -> bool {
        self.orchestrator.scheduler_mut().cancel(self.player.id, id)
    }

    /// Add a quest definition to the session catalog.
    pub fn add_quest(&mut self, quest: QuestDef) -> QuestId {
        self.catalog.insert(quest)
    }

    /// Advance the active quest arc to its next act, recording a milestone.
    /// Returns false with no active arc or when already in the final act.
    pub fn advance_quest_act(&mut self, event: impl Into<String>) -> bool {
        self.player
            .quest
            .as_mut()
            .map(|quest| quest.advance_act(event))
            .unwrap_or(false)
    }

    /// Grant experience. Returns true when the ladder maps the new total to
    /// a higher level; the level is updated but stat points are applied
    /// separately through `level_up`.
    pub fn gain_experience(&mut self, amount: u32) -> bool {
        self.player.experience = self.player.experience.saturating_add(amount);
        let mapped = self.progression.level_from_experience(self.player.experience);
        if mapped > self.player.level {
            self.player.level = mapped;
            true
        } else {
            false
        }
    }

    /// Apply a level-up stat allocation.
    pub fn level_up(
        &mut self,
        allocation: &Allocation,
    ) -> Result<DerivedBonuses, AllocationExceeded> {
        self.progression
            .apply_level_up(&mut self.player.stats, allocation)
    }

    /// Grant skill experience. Returns whether the skill leveled up.
    pub fn gain_skill_experience(&mut self, skill: &str, amount: u32) -> bool {
        self.progression
            .gain_skill_experience(&mut self.player.skills, skill, amount)
    }

    /// Save the session to a file.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), SessionError> {
        let saved = SavedGame::new(
            self.player.clone(),
            self.orchestrator.scheduler().export_pending(self.player.id),
        );
        saved.save_json(path).await?;
        Ok(())
    }

    /// Load a saved session from a file, with default configuration.
    pub async fn load(path: impl AsRef<Path>, narrator: N) -> Result<Self, SessionError> {
        Self::load_with_config(path, SessionConfig::new(""), narrator).await
    }

    /// Load a saved session from a file with explicit configuration.
    /// The saved player replaces the configured name and quest.
    pub async fn load_with_config(
        path: impl AsRef<Path>,
        config: SessionConfig,
        narrator: N,
    ) -> Result<Self, SessionError> {
        let saved = SavedGame::load_json(path).await?;

        let mut session = Self::new(config, narrator);
        session.player = saved.player;
        session
            .orchestrator
            .scheduler_mut()
            .restore(session.player.id, saved.pending_consequences);
        Ok(session)
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    /// Use with caution - direct modifications bypass the turn pipeline.
    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    pub fn progression(&self) -> &ProgressionTracker {
        &self.progression
    }

    pub fn orchestrator(&self) -> &TurnOrchestrator {
        &self.orchestrator
    }

    pub fn pending_consequences(&self) -> usize {
        self.orchestrator.scheduler().pending_count(self.player.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::narrator::{NarrationRequest, NarratorError};
    use async_trait::async_trait;

    struct BrokenNarrator;

    #[async_trait]
    impl Narrator for BrokenNarrator {
        async fn narrate(&self, _request: &NarrationRequest) -> Result<Narration, NarratorError> {
            Err(NarratorError::Unavailable("connection refused".to_string()))
        }
    }

    #[test]
    fn test_session_config_builder() {
        let config = SessionConfig::new("Wren")
            .with_quest(QuestArc::new("The Sunken Archive", "", 3));

        assert_eq!(config.player_name, "Wren");
        assert_eq!(config.quest.as_ref().unwrap().total_acts, 3);
    }

    #[tokio::test]
    async fn test_narrator_failure_degrades_but_commits_state() {
        let mut session = GameSession::new(SessionConfig::new("Wren"), BrokenNarrator);
        session.schedule_consequence(
            1,
            "ambush",
            "An arrow whistles in",
            vec![TurnEffect::HealthChanged { amount: -10 }],
        );

        let response = session.act("walk the ridge").await;

        // Narration degraded, but the turn and its deltas are committed.
        assert!(response.degraded);
        assert!(!response.narrative.is_empty());
        assert!(response.choices.len() >= 2);
        assert_eq!(session.player().turn, 1);
        assert_eq!(
            session.player().stats.health.current(),
            session.player().stats.health.maximum() - 10
        );
        assert_eq!(response.fired_consequences.len(), 1);
    }

    #[tokio::test]
    async fn test_gain_experience_maps_to_level() {
        let mut session = GameSession::new(SessionConfig::new("Wren"), BrokenNarrator);

        assert!(!session.gain_experience(50));
        assert_eq!(session.player().level, 1);

        // 50 + 60 = 110 crosses the level 2 threshold.
        assert!(session.gain_experience(60));
        assert_eq!(session.player().level, 2);
    }
}
