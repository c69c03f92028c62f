//! Local persistence.
//!
//! Everything lives in a small key-value store:
//! - `decks`: the whole deck collection as one JSON array
//! - `settings`: display settings
//!
//! The deck collection is read and rewritten as a unit on every save.

mod deck_store;
mod kv;
pub mod migrate;
mod settings;

pub use deck_store::*;
pub use kv::*;
pub use settings::*;

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Errors from deck-level operations.
#[derive(Debug, Error)]
pub enum DeckError {
    #[error("Deck not found: {0}")]
    DeckNotFound(String),

    #[error("Match {match_id} not found in deck {deck_id}")]
    MatchNotFound { deck_id: String, match_id: String },

    #[error("Version {version_id} not found in deck {deck_id}")]
    VersionNotFound { deck_id: String, version_id: String },

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl DeckError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DeckError::DeckNotFound(_)
                | DeckError::MatchNotFound { .. }
                | DeckError::VersionNotFound { .. }
        )
    }
}

/// Key holding the deck collection.
pub const DECKS_KEY: &str = "decks";

/// Key holding display settings.
pub const SETTINGS_KEY: &str = "settings";

/// Configuration for storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    /// File backing a key in the file store.
    pub fn key_path(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", key))
    }

    pub fn decks_path(&self) -> PathBuf {
        self.key_path(DECKS_KEY)
    }

    pub fn settings_path(&self) -> PathBuf {
        self.key_path(SETTINGS_KEY)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}
