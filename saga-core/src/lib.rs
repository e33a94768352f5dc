//! Turn-resolution engine for an AI-narrated adventure backend.
//!
//! This crate provides:
//! - Deterministic encounter risk assessment with tier mapping
//! - Delayed consequence scheduling with at-most-once firing
//! - Character and skill progression with budgeted level-ups
//! - A turn orchestrator that assembles narration requests for an external
//!   narrative generator (the engine never talks to the LLM itself)
//!
//! # Quick Start
//!
//! ```ignore
//! use saga_core::{GameSession, SessionConfig, Narrator};
//!
//! #[tokio::main]
//! async fn main() {
//!     let narrator = MyLlmNarrator::from_env();
//!     let mut session = GameSession::new(SessionConfig::new("Wren"), narrator);
//!
//!     let response = session.act("I follow the lantern light").await;
//!     println!("{}", response.narrative);
//!
//!     session.save("wren.json").await.unwrap();
//! }
//! ```

pub mod consequence;
pub mod narrator;
pub mod persist;
pub mod player;
pub mod progression;
pub mod quest;
pub mod risk;
pub mod session;
pub mod stats;
pub mod testing;
pub mod turn;

// Primary public API
pub use consequence::{ConsequenceEntry, ConsequenceId, ConsequenceScheduler, ConsequenceStatus};
pub use narrator::{Narration, NarrationRequest, Narrator, NarratorError};
pub use player::{Item, Player, PlayerId, PlayerSnapshot, Skill};
pub use progression::{Allocation, AllocationExceeded, ProgressionConfig, ProgressionTracker};
pub use quest::{InMemoryQuestCatalog, QuestArc, QuestCatalog, QuestDef, QuestId};
pub use risk::{Encounter, RiskAssessment, RiskAssessor, RiskConfig, RiskTier};
pub use session::{GameSession, Response, SessionConfig, SessionError};
pub use stats::{Attribute, AttributeScores, CharacterStats, DerivedBonuses, ResourcePool};
pub use testing::{MockNarrator, TestHarness};
pub use turn::{OutcomeRoll, PlayerAction, TurnEffect, TurnOrchestrator, TurnResult};
