//! Turn resolution pipeline.
//!
//! One call resolves one turn for one player, in a fixed order: advance the
//! turn counter, fire due consequences and apply their deltas, assess the
//! action's encounter against the post-effect stats, then assemble the
//! narration request for the external generator. State mutation completes
//! before narration is ever attempted, so a failed narration can never
//! corrupt gameplay state.

use crate::consequence::{ConsequenceEntry, ConsequenceId, ConsequenceScheduler};
use crate::narrator::NarrationRequest;
use crate::player::Player;
use crate::quest::{QuestCatalog, QuestId};
use crate::risk::{Encounter, RiskAssessment, RiskAssessor};
use crate::stats::Attribute;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A concrete state change applied to a player during a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TurnEffect {
    HealthChanged { amount: i32 },
    ManaChanged { amount: i32 },
    StaminaChanged { amount: i32 },
    AttributeChanged { attribute: Attribute, amount: i8 },
    ItemAdded { name: String, quantity: u32 },
    ItemRemoved { name: String, quantity: u32 },
    ExperienceGained { amount: u32 },
}

/// Apply effects to a player in order. Pool and attribute invariants hold
/// regardless of the deltas: pools clamp at [0, max], attributes at [1, 20].
pub fn apply_effects(player: &mut Player, effects: &[TurnEffect]) {
    for effect in effects {
        match effect {
            TurnEffect::HealthChanged { amount } => player.stats.health.apply(*amount),
            TurnEffect::ManaChanged { amount } => player.stats.mana.apply(*amount),
            TurnEffect::StaminaChanged { amount } => player.stats.stamina.apply(*amount),
            TurnEffect::AttributeChanged { attribute, amount } => {
                player.stats.adjust_attribute(*attribute, *amount)
            }
            TurnEffect::ItemAdded { name, quantity } => player.add_item(name.clone(), *quantity),
            TurnEffect::ItemRemoved { name, quantity } => {
                player.remove_item(name, *quantity);
            }
            TurnEffect::ExperienceGained { amount } => {
                player.experience = player.experience.saturating_add(*amount)
            }
        }
    }
}

/// The sampled result of an assessed action.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OutcomeRoll {
    pub roll: f64,
    pub success: bool,
}

impl OutcomeRoll {
    /// Roll against a success probability.
    pub fn roll(success_probability: f64) -> Self {
        let roll = rand::thread_rng().gen::<f64>();
        Self {
            roll,
            success: roll < success_probability,
        }
    }
}

/// A player's chosen action for one turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerAction {
    pub text: String,
    /// Quest whose definition supplies the encounter metadata.
    pub quest: Option<QuestId>,
    /// Explicit encounter metadata; takes precedence over the quest lookup.
    pub encounter: Option<Encounter>,
}

impl PlayerAction {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            quest: None,
            encounter: None,
        }
    }

    pub fn with_quest(mut self, quest: QuestId) -> Self {
        self.quest = Some(quest);
        self
    }

    pub fn with_encounter(mut self, encounter: Encounter) -> Self {
        self.encounter = Some(encounter);
        self
    }

    /// The encounter this action implies, if any. A quest id missing from
    /// the catalog degrades to no encounter instead of failing the turn.
    fn resolve_encounter(&self, catalog: &dyn QuestCatalog) -> Option<Encounter> {
        if let Some(encounter) = &self.encounter {
            return Some(encounter.clone());
        }
        let quest_id = self.quest?;
        match catalog.get(quest_id) {
            Some(quest) => Some(Encounter::from_quest(quest)),
            None => {
                tracing::debug!(%quest_id, "action references unknown quest, skipping assessment");
                None
            }
        }
    }
}

/// Everything produced by resolving one turn.
#[derive(Debug, Clone)]
pub struct TurnResult {
    /// Handed to the external narrative generator; the orchestrator itself
    /// never talks to the LLM.
    pub narration_request: NarrationRequest,
    /// Deltas applied to the player this turn, in application order.
    pub applied_effects: Vec<TurnEffect>,
    pub fired_consequences: Vec<ConsequenceEntry>,
    pub assessment: Option<RiskAssessment>,
}

/// Composes the assessor and scheduler into the per-turn pipeline.
#[derive(Debug, Clone, Default)]
pub struct TurnOrchestrator {
    assessor: RiskAssessor,
    scheduler: ConsequenceScheduler,
}

impl TurnOrchestrator {
    pub fn new(assessor: RiskAssessor) -> Self {
        Self {
            assessor,
            scheduler: ConsequenceScheduler::new(),
        }
    }

    pub fn assessor(&self) -> &RiskAssessor {
        &self.assessor
    }

    pub fn scheduler(&self) -> &ConsequenceScheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut ConsequenceScheduler {
        &mut self.scheduler
    }

    /// Schedule a consequence to fire `delay` turns from the player's
    /// current turn.
    pub fn schedule_in(
        &mut self,
        player: &Player,
        delay: u32,
        event: impl Into<String>,
        description: impl Into<String>,
        effects: Vec<TurnEffect>,
    ) -> ConsequenceId {
        self.scheduler
            .schedule(player.id, player.turn + delay, event, description, effects)
    }

    /// Resolve one turn. See the module docs for the fixed sequence.
    ///
    /// Missing or unknown encounter categories degrade inside the assessor;
    /// nothing in this path aborts the turn. Persisting the updated player
    /// is the caller's responsibility after return.
    pub fn process_turn(
        &mut self,
        player: &mut Player,
        action: &PlayerAction,
        catalog: &dyn QuestCatalog,
    ) -> TurnResult {
        player.turn += 1;
        if let Some(quest) = player.quest.as_mut() {
            quest.record_turn();
        }

        let fired = self.scheduler.advance_turn(player.id, player.turn);
        let mut applied_effects = Vec::new();
        for entry in &fired {
            apply_effects(player, &entry.effects);
            applied_effects.extend(entry.effects.iter().cloned());
        }

        let assessment = action
            .resolve_encounter(catalog)
            .map(|encounter| self.assessor.assess(player, &encounter));
        let outcome = assessment
            .as_ref()
            .map(|a| OutcomeRoll::roll(a.success_probability));

        let narration_request = NarrationRequest {
            player: player.snapshot(),
            action: action.text.clone(),
            risk_tier: assessment.as_ref().map(|a| a.tier),
            consequences: fired.iter().map(|e| e.description.clone()).collect(),
            outcome,
        };

        TurnResult {
            narration_request,
            applied_effects,
            fired_consequences: fired,
            assessment,
        }
    }
}
