//! The narrative generator boundary.
//!
//! The engine never talks to an LLM itself: each processed turn produces a
//! `NarrationRequest`, and an external `Narrator` implementation renders it.
//! Generator failures and malformed output degrade to a fallback narration;
//! they never corrupt turn state, which is already committed by the time
//! narration is attempted.

use crate::player::PlayerSnapshot;
use crate::risk::RiskTier;
use crate::turn::OutcomeRoll;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Fewest choices a well-formed narration offers.
pub const MIN_CHOICES: usize = 2;

/// Most choices a well-formed narration offers.
pub const MAX_CHOICES: usize = 4;

/// Errors from the external narrative generator.
#[derive(Debug, Error)]
pub enum NarratorError {
    #[error("narrative generator unavailable: {0}")]
    Unavailable(String),

    #[error("narrative generator returned malformed output: {0}")]
    Malformed(String),
}

/// Everything the external generator needs to render one turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrationRequest {
    pub player: PlayerSnapshot,
    pub action: String,
    /// Risk tier of the assessed encounter, when the action implied one.
    pub risk_tier: Option<RiskTier>,
    /// Descriptions of consequences that fired this turn.
    pub consequences: Vec<String>,
    pub outcome: Option<OutcomeRoll>,
}

/// Generated narrative plus the player's next choices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Narration {
    pub narrative: String,
    pub choices: Vec<String>,
    pub metadata: HashMap<String, String>,
}

impl Narration {
    pub fn new(narrative: impl Into<String>) -> Self {
        Self {
            narrative: narrative.into(),
            choices: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_choice(mut self, choice: impl Into<String>) -> Self {
        self.choices.push(choice.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Degraded narration used when the generator fails. Keeps the player
    /// moving without pretending anything happened that did not.
    pub fn fallback(request: &NarrationRequest) -> Self {
        let mut narrative = String::from("The moment passes in a blur, and the details escape you.");
        if !request.consequences.is_empty() {
            narrative.push_str(" Still, the echoes of earlier choices catch up: ");
            narrative.push_str(&request.consequences.join("; "));
            narrative.push('.');
        }
        Self::new(narrative)
            .with_metadata("degraded", "true")
            .normalize()
    }

    /// Repair malformed output: pad missing choices from stock options and
    /// truncate any excess.
    pub fn normalize(mut self) -> Self {
        const STOCK_CHOICES: [&str; 2] = ["Press on.", "Take stock of your situation."];
        let mut stock = STOCK_CHOICES.iter();
        while self.choices.len() < MIN_CHOICES {
            match stock.next() {
                Some(choice) => self.choices.push((*choice).to_string()),
                None => break,
            }
        }
        self.choices.truncate(MAX_CHOICES);
        self
    }

    pub fn is_well_formed(&self) -> bool {
        !self.narrative.is_empty()
            && (MIN_CHOICES..=MAX_CHOICES).contains(&self.choices.len())
    }
}

/// External narrative generator.
#[async_trait]
pub trait Narrator: Send + Sync {
    async fn narrate(&self, request: &NarrationRequest) -> Result<Narration, NarratorError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::Player;

    fn request() -> NarrationRequest {
        NarrationRequest {
            player: Player::new("Wren").snapshot(),
            action: "open the door".to_string(),
            risk_tier: Some(RiskTier::Mystery),
            consequences: vec!["the guards remember you".to_string()],
            outcome: None,
        }
    }

    #[test]
    fn test_fallback_is_well_formed() {
        let narration = Narration::fallback(&request());
        assert!(narration.is_well_formed());
        assert_eq!(narration.metadata.get("degraded").map(String::as_str), Some("true"));
        assert!(narration.narrative.contains("guards remember"));
    }

    #[test]
    fn test_normalize_pads_and_truncates() {
        let padded = Narration::new("text").normalize();
        assert_eq!(padded.choices.len(), MIN_CHOICES);

        let truncated = Narration::new("text")
            .with_choice("a")
            .with_choice("b")
            .with_choice("c")
            .with_choice("d")
            .with_choice("e")
            .normalize();
        assert_eq!(truncated.choices.len(), MAX_CHOICES);
    }

    #[test]
    fn test_well_formed_bounds() {
        let narration = Narration::new("text").with_choice("a");
        assert!(!narration.is_well_formed());
        assert!(narration.with_choice("b").is_well_formed());
        assert!(!Narration::new("").normalize().is_well_formed());
    }
}
