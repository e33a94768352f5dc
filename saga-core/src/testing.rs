//! Testing utilities for the adventure engine.
//!
//! This module provides tools for integration testing:
//! - `MockNarrator` for deterministic testing without a generator backend
//! - `TestHarness` for scripted game scenarios
//! - Assertion helpers for verifying game state

use crate::narrator::{Narration, NarrationRequest, Narrator, NarratorError};
use crate::session::{GameSession, Response, SessionConfig};
use crate::turn::{PlayerAction, TurnEffect};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// A scripted reply from the mock narrator.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// Return this narration.
    Narration(Narration),
    /// Fail with this message, exercising the fallback path.
    Failure(String),
}

/// A mock narrator that returns scripted replies in order.
///
/// Clones share the same script, so a harness can keep queueing replies
/// after the narrator has been moved into a session.
#[derive(Debug, Clone, Default)]
pub struct MockNarrator {
    script: Arc<Mutex<VecDeque<ScriptedReply>>>,
}

impl MockNarrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue(&self, reply: ScriptedReply) {
        self.script.lock().unwrap().push_back(reply);
    }

    pub fn queue_narrative(&self, text: impl Into<String>) {
        self.queue(ScriptedReply::Narration(Narration::new(text)));
    }

    pub fn queue_narration(&self, narration: Narration) {
        self.queue(ScriptedReply::Narration(narration));
    }

    pub fn queue_failure(&self, message: impl Into<String>) {
        self.queue(ScriptedReply::Failure(message.into()));
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap().len()
    }
}

#[async_trait]
impl Narrator for MockNarrator {
    async fn narrate(&self, _request: &NarrationRequest) -> Result<Narration, NarratorError> {
        let reply = self.script.lock().unwrap().pop_front();
        match reply {
            Some(ScriptedReply::Narration(narration)) => Ok(narration),
            Some(ScriptedReply::Failure(message)) => Err(NarratorError::Unavailable(message)),
            None => Ok(Narration::new("The narrator has nothing more to say.")),
        }
    }
}

/// Test harness for running scripted game scenarios.
pub struct TestHarness {
    /// The game session under test.
    pub session: GameSession<MockNarrator>,
    script: MockNarrator,
}

impl TestHarness {
    /// Create a harness with a default test player.
    pub fn new() -> Self {
        Self::with_config(SessionConfig::new("Test Hero"))
    }

    pub fn with_config(config: SessionConfig) -> Self {
        let script = MockNarrator::new();
        let session = GameSession::new(config, script.clone());
        Self { session, script }
    }

    /// Queue a narrative reply.
    pub fn expect_narrative(&mut self, text: impl Into<String>) -> &mut Self {
        self.script.queue_narrative(text);
        self
    }

    /// Queue a full narration reply.
    pub fn expect_narration(&mut self, narration: Narration) -> &mut Self {
        self.script.queue_narration(narration);
        self
    }

    /// Queue a narrator failure.
    pub fn expect_failure(&mut self) -> &mut Self {
        self.script.queue_failure("scripted failure");
        self
    }

    /// Send a plain text action.
    pub async fn act(&mut self, text: &str) -> Response {
        self.session.act(text).await
    }

    /// Send a full action.
    pub async fn action(&mut self, action: PlayerAction) -> Response {
        self.session.player_action(action).await
    }

    /// Schedule a consequence relative to the current turn.
    pub fn schedule(
        &mut self,
        delay: u32,
        event: &str,
        description: &str,
        effects: Vec<TurnEffect>,
    ) {
        self.session
            .schedule_consequence(delay, event, description, effects);
    }

    /// Current player health as (current, max).
    pub fn player_health(&self) -> (u32, u32) {
        let health = &self.session.player().stats.health;
        (health.current(), health.maximum())
    }

    pub fn turn(&self) -> u32 {
        self.session.player().turn
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Assertion Helpers
// ============================================================================

/// Assert the player is on the expected turn.
#[track_caller]
pub fn assert_turn(harness: &TestHarness, expected: u32) {
    let actual = harness.turn();
    assert_eq!(actual, expected, "Expected turn {expected}, got {actual}");
}

/// Assert player health is at expected values.
#[track_caller]
pub fn assert_health(harness: &TestHarness, current: u32, max: u32) {
    let (actual_current, actual_max) = harness.player_health();
    assert_eq!(
        (actual_current, actual_max),
        (current, max),
        "Expected health {current}/{max}, got {actual_current}/{actual_max}"
    );
}

/// Assert the number of consequences still pending for the player.
#[track_caller]
pub fn assert_pending_consequences(harness: &TestHarness, expected: usize) {
    let actual = harness.session.pending_consequences();
    assert_eq!(
        actual, expected,
        "Expected {expected} pending consequences, got {actual}"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_narrator_scripted_order() {
        let mut harness = TestHarness::new();
        harness
            .expect_narrative("Response 1")
            .expect_narrative("Response 2");

        assert_eq!(harness.act("first").await.narrative, "Response 1");
        assert_eq!(harness.act("second").await.narrative, "Response 2");

        // After the script runs dry, the default reply comes back.
        assert!(harness
            .act("third")
            .await
            .narrative
            .contains("nothing more to say"));
    }

    #[tokio::test]
    async fn test_scripted_failure_reaches_fallback() {
        let mut harness = TestHarness::new();
        harness.expect_failure();

        let response = harness.act("poke the hornet nest").await;
        assert!(response.degraded);
        assert_turn(&harness, 1);
    }

    #[tokio::test]
    async fn test_harness_schedules_and_tracks_consequences() {
        let mut harness = TestHarness::new();
        harness.schedule(
            2,
            "storm",
            "The storm breaks",
            vec![TurnEffect::StaminaChanged { amount: -20 }],
        );

        assert_pending_consequences(&harness, 1);
        harness.act("make camp").await;
        assert_pending_consequences(&harness, 1);
        harness.act("break camp").await;
        assert_pending_consequences(&harness, 0);
    }
}
