//! Save/load for player state.
//!
//! Serializes a player and their pending consequences to versioned JSON.
//! Persistence is the caller's responsibility after a successful turn; these
//! helpers assume read-after-write consistency for a single player.

use crate::consequence::ConsequenceEntry;
use crate::player::Player;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tokio::fs;

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Current save file version.
const SAVE_VERSION: u32 = 1;

/// A saved game with all state needed to resume play.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedGame {
    /// Save format version for compatibility checking.
    pub version: u32,

    /// When the save was created (unix seconds).
    pub saved_at: String,

    /// The complete player state.
    pub player: Player,

    /// Consequences still pending for this player.
    pub pending_consequences: Vec<ConsequenceEntry>,

    /// Metadata about the save.
    pub metadata: SaveMetadata,
}

/// Metadata about the save file, readable without loading the full state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveMetadata {
    pub player_name: String,
    pub level: u8,
    pub turn: u32,
    pub quest_title: Option<String>,
    #[serde(default)]
    pub saved_at: String,
}

impl SavedGame {
    /// Create a save from the current game state.
    pub fn new(player: Player, pending_consequences: Vec<ConsequenceEntry>) -> Self {
        let saved_at = timestamp_now();
        let metadata = SaveMetadata {
            player_name: player.name.clone(),
            level: player.level,
            turn: player.turn,
            quest_title: player.quest.as_ref().map(|q| q.title.clone()),
            saved_at: saved_at.clone(),
        };

        Self {
            version: SAVE_VERSION,
            saved_at,
            player,
            pending_consequences,
            metadata,
        }
    }

    /// Save to a JSON file.
    pub async fn save_json(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Load from a JSON file.
    pub async fn load_json(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let content = fs::read_to_string(path).await?;
        let saved: Self = serde_json::from_str(&content)?;

        if saved.version != SAVE_VERSION {
            return Err(PersistError::VersionMismatch {
                expected: SAVE_VERSION,
                found: saved.version,
            });
        }

        Ok(saved)
    }

    /// Read a save's metadata without loading the full state.
    pub async fn peek_metadata(path: impl AsRef<Path>) -> Result<SaveMetadata, PersistError> {
        let content = fs::read_to_string(path).await?;

        #[derive(Deserialize)]
        struct Partial {
            version: u32,
            metadata: SaveMetadata,
        }

        let partial: Partial = serde_json::from_str(&content)?;

        if partial.version != SAVE_VERSION {
            return Err(PersistError::VersionMismatch {
                expected: SAVE_VERSION,
                found: partial.version,
            });
        }

        Ok(partial.metadata)
    }
}

/// Information about a save file.
#[derive(Debug, Clone)]
pub struct SaveInfo {
    pub path: String,
    pub metadata: SaveMetadata,
}

/// List all save files in a directory, most recent path first.
pub async fn list_saves(dir: impl AsRef<Path>) -> Result<Vec<SaveInfo>, PersistError> {
    let mut saves = Vec::new();
    let mut entries = fs::read_dir(dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            if let Ok(metadata) = SavedGame::peek_metadata(&path).await {
                saves.push(SaveInfo {
                    path: path.to_string_lossy().to_string(),
                    metadata,
                });
            }
        }
    }

    saves.sort_by(|a, b| b.path.cmp(&a.path));
    Ok(saves)
}

/// Create an auto-save file name.
pub fn auto_save_path(base_dir: impl AsRef<Path>, player_name: &str) -> std::path::PathBuf {
    let sanitized = sanitize(player_name);
    base_dir.as_ref().join(format!("{sanitized}_autosave.json"))
}

/// Create a manual save file name with a timestamp.
pub fn manual_save_path(base_dir: impl AsRef<Path>, player_name: &str) -> std::path::PathBuf {
    let sanitized = sanitize(player_name);
    let timestamp = timestamp_now();
    base_dir
        .as_ref()
        .join(format!("{sanitized}_{timestamp}.json"))
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

/// Current timestamp as unix seconds.
fn timestamp_now() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();

    format!("{}", now.as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quest::QuestArc;
    use crate::turn::TurnEffect;

    fn temp_path(tag: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("saga_{}_{}.json", tag, uuid::Uuid::new_v4()))
    }

    fn sample_save() -> SavedGame {
        let mut player = Player::new("Wren");
        player.turn = 12;
        player.level = 4;
        player.quest = Some(QuestArc::new("The Sunken Archive", "", 3));
        player.add_item("Lantern", 1);

        let entry = {
            let mut scheduler = crate::consequence::ConsequenceScheduler::new();
            scheduler.schedule(
                player.id,
                15,
                "flood",
                "Water reaches the lower stacks",
                vec![TurnEffect::StaminaChanged { amount: -10 }],
            );
            scheduler.export_pending(player.id)
        };

        SavedGame::new(player, entry)
    }

    #[tokio::test]
    async fn test_save_load_round_trip() {
        let path = temp_path("round_trip");
        let saved = sample_save();
        saved.save_json(&path).await.unwrap();

        let loaded = SavedGame::load_json(&path).await.unwrap();
        assert_eq!(loaded.player.name, "Wren");
        assert_eq!(loaded.player.turn, 12);
        assert_eq!(loaded.pending_consequences.len(), 1);
        assert_eq!(loaded.pending_consequences[0].event, "flood");

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_peek_metadata_without_full_load() {
        let path = temp_path("peek");
        sample_save().save_json(&path).await.unwrap();

        let metadata = SavedGame::peek_metadata(&path).await.unwrap();
        assert_eq!(metadata.player_name, "Wren");
        assert_eq!(metadata.level, 4);
        assert_eq!(metadata.turn, 12);
        assert_eq!(metadata.quest_title.as_deref(), Some("The Sunken Archive"));

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_version_mismatch_rejected() {
        let path = temp_path("version");
        let mut saved = sample_save();
        saved.version = 99;
        let content = serde_json::to_string_pretty(&saved).unwrap();
        tokio::fs::write(&path, content).await.unwrap();

        let err = SavedGame::load_json(&path).await.unwrap_err();
        assert!(matches!(
            err,
            PersistError::VersionMismatch {
                expected: SAVE_VERSION,
                found: 99
            }
        ));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_save_paths_sanitized() {
        let auto = auto_save_path("/tmp/saves", "Wren of the Vale");
        assert!(auto.to_string_lossy().contains("Wren_of_the_Vale_autosave"));
    }
}
