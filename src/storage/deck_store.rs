//! Deck repository.
//!
//! The whole collection is one JSON array under [`DECKS_KEY`]. Reads migrate
//! every record to the current shape; `save_deck` is the only write and
//! upserts a single deck by ID. Every higher-level edit is a fresh read of
//! one deck, a pure change, and a `save_deck` of the result.
//!
//! Two edits built from the same stale copy of a deck are last-write-wins.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::migrate::migrate_deck;
use super::{DeckError, KeyValueStore, StorageError, DECKS_KEY};
use crate::models::{CardCollection, Deck, DeckVersion, Match};

/// Input for recording a match.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMatch {
    #[serde(default)]
    pub opponent_deck: String,
    pub game_wins: u32,
    pub game_losses: u32,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Changes to an existing match. `None` leaves a field as it is.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchEdit {
    pub opponent_deck: Option<String>,
    pub game_wins: Option<u32>,
    pub game_losses: Option<u32>,
    pub notes: Option<String>,
}

/// Deck persistence over a key-value backend.
pub struct DeckStore {
    backend: Arc<dyn KeyValueStore>,
    /// Serializes read-modify-write of the collection blob within this process
    write_lock: Mutex<()>,
    allow_empty_score: bool,
}

impl DeckStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self {
            backend,
            write_lock: Mutex::new(()),
            allow_empty_score: true,
        }
    }

    /// Whether matches with no games recorded (0-0) are accepted.
    pub fn with_allow_empty_score(mut self, allow: bool) -> Self {
        self.allow_empty_score = allow;
        self
    }

    /// Raw stored records, unmigrated. An unset key is an empty collection.
    async fn read_raw(&self) -> Result<Vec<Value>, StorageError> {
        match self.backend.get(DECKS_KEY).await? {
            Some(data) if !data.trim().is_empty() => Ok(serde_json::from_str(&data)?),
            _ => Ok(Vec::new()),
        }
    }

    /// All decks, migrated to the current shape, in stored order.
    ///
    /// Records that still fail to decode are skipped with a warning; they stay
    /// untouched in storage. A collection blob that is not a JSON array reads
    /// as empty, while `save_deck` refuses to overwrite it.
    pub async fn get_decks(&self) -> Result<Vec<Deck>, StorageError> {
        let raw = match self.read_raw().await {
            Ok(raw) => raw,
            Err(StorageError::Json(e)) => {
                warn!("Ignoring unreadable deck collection: {}", e);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };
        let total = raw.len();

        let decks: Vec<Deck> = raw
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| match migrate_deck(value) {
                Ok(deck) => Some(deck),
                Err(e) => {
                    warn!("Skipping undecodable deck at index {}: {}", index, e);
                    None
                }
            })
            .collect();

        debug!(
            "Loaded {} of {} decks from {} store",
            decks.len(),
            total,
            self.backend.name()
        );
        Ok(decks)
    }

    /// One deck by ID, or `None` if there is no such deck.
    pub async fn get_deck(&self, deck_id: &str) -> Result<Option<Deck>, StorageError> {
        let decks = self.get_decks().await?;
        Ok(decks.into_iter().find(|d| d.id == deck_id))
    }

    /// Insert or replace a deck.
    ///
    /// An existing deck with the same ID is replaced in place; otherwise the
    /// deck is appended. The whole collection is rewritten in one `set`.
    pub async fn save_deck(&self, deck: &Deck) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;

        let mut raw = self.read_raw().await?;
        let value = serde_json::to_value(deck)?;

        let existing = raw
            .iter()
            .position(|d| d.get("id").and_then(Value::as_str) == Some(deck.id.as_str()));
        match existing {
            Some(index) => raw[index] = value,
            None => raw.push(value),
        }

        let data = serde_json::to_string(&raw)?;
        self.backend.set(DECKS_KEY, &data).await?;

        info!("Saved deck {} ({} decks total)", deck.id, raw.len());
        Ok(())
    }

    /// Fetch a deck, apply `change`, and save the result.
    ///
    /// The deck is read immediately before the change so the window for a
    /// concurrent edit to be overwritten stays short.
    pub async fn update_deck<F, T>(&self, deck_id: &str, change: F) -> Result<(Deck, T), DeckError>
    where
        F: FnOnce(&mut Deck) -> Result<T, DeckError>,
    {
        let mut deck = self
            .get_deck(deck_id)
            .await?
            .ok_or_else(|| DeckError::DeckNotFound(deck_id.to_string()))?;

        let output = change(&mut deck)?;
        self.save_deck(&deck).await?;
        Ok((deck, output))
    }

    /// Create and persist an empty deck.
    pub async fn create_deck(&self, name: &str, format: &str) -> Result<Deck, DeckError> {
        if name.trim().is_empty() {
            return Err(DeckError::Validation("deck name is required".to_string()));
        }

        let deck = Deck::new(name, format);
        self.save_deck(&deck).await?;
        info!("Created deck {} ({})", deck.name, deck.id);
        Ok(deck)
    }

    /// Rename a deck or change its format.
    pub async fn edit_deck(
        &self,
        deck_id: &str,
        name: Option<&str>,
        format: Option<&str>,
    ) -> Result<Deck, DeckError> {
        let (deck, _) = self
            .update_deck(deck_id, |deck| {
                if let Some(name) = name {
                    let name = name.trim();
                    if name.is_empty() {
                        return Err(DeckError::Validation("deck name is required".to_string()));
                    }
                    deck.name = name.to_string();
                }
                if let Some(format) = format {
                    deck.format = format.trim().to_string();
                }
                Ok(())
            })
            .await?;
        Ok(deck)
    }

    fn check_score(&self, game_wins: u32, game_losses: u32) -> Result<(), DeckError> {
        if !self.allow_empty_score && game_wins == 0 && game_losses == 0 {
            return Err(DeckError::Validation(
                "a match needs at least one game won or lost".to_string(),
            ));
        }
        Ok(())
    }

    /// Record a match at the front of the deck's history.
    pub async fn add_match(&self, deck_id: &str, input: NewMatch) -> Result<Match, DeckError> {
        self.check_score(input.game_wins, input.game_losses)?;

        let mut record = Match::new(&input.opponent_deck, input.game_wins, input.game_losses);
        record.set_notes(input.notes);

        let (_, record) = self
            .update_deck(deck_id, move |deck| {
                deck.add_match(record.clone());
                Ok(record)
            })
            .await?;

        info!(
            "Recorded {} ({}) vs {} for deck {}",
            record.result(),
            record.score(),
            record.opponent_deck,
            deck_id
        );
        Ok(record)
    }

    /// Edit a match. The result is re-derived from the new score; the date
    /// never changes.
    pub async fn edit_match(
        &self,
        deck_id: &str,
        match_id: &str,
        edit: MatchEdit,
    ) -> Result<Match, DeckError> {
        let (_, record) = self
            .update_deck(deck_id, |deck| {
                let record = deck
                    .find_match_mut(match_id)
                    .ok_or_else(|| DeckError::MatchNotFound {
                        deck_id: deck_id.to_string(),
                        match_id: match_id.to_string(),
                    })?;

                let wins = edit.game_wins.unwrap_or(record.game_wins());
                let losses = edit.game_losses.unwrap_or(record.game_losses());
                self.check_score(wins, losses)?;

                record.set_score(wins, losses);
                if let Some(opponent) = edit.opponent_deck.as_deref() {
                    record.set_opponent(opponent);
                }
                if let Some(notes) = edit.notes {
                    record.set_notes(Some(notes));
                }
                Ok(record.clone())
            })
            .await?;
        Ok(record)
    }

    /// Delete a match, returning it.
    pub async fn delete_match(&self, deck_id: &str, match_id: &str) -> Result<Match, DeckError> {
        let (_, removed) = self
            .update_deck(deck_id, |deck| {
                deck.remove_match(match_id)
                    .ok_or_else(|| DeckError::MatchNotFound {
                        deck_id: deck_id.to_string(),
                        match_id: match_id.to_string(),
                    })
            })
            .await?;

        info!("Deleted match {} from deck {}", match_id, deck_id);
        Ok(removed)
    }

    /// Deck-builder save: replace the card list (and optionally the name)
    /// and append a version snapshot.
    pub async fn save_cards(
        &self,
        deck_id: &str,
        name: Option<&str>,
        cards: CardCollection,
    ) -> Result<DeckVersion, DeckError> {
        let (_, version) = self
            .update_deck(deck_id, |deck| {
                if let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) {
                    deck.name = name.to_string();
                }
                Ok(deck.commit_cards(cards).clone())
            })
            .await?;

        info!("Saved version {} for deck {}", version.id, deck_id);
        Ok(version)
    }

    /// Restore a deck's cards from one of its versions.
    pub async fn revert_to_version(
        &self,
        deck_id: &str,
        version_id: &str,
    ) -> Result<Deck, DeckError> {
        let (deck, _) = self
            .update_deck(deck_id, |deck| {
                if deck.revert_to_version(version_id) {
                    Ok(())
                } else {
                    Err(DeckError::VersionNotFound {
                        deck_id: deck_id.to_string(),
                        version_id: version_id.to_string(),
                    })
                }
            })
            .await?;

        info!("Reverted deck {} to version {}", deck_id, version_id);
        Ok(deck)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Board, Card, MatchResult};
    use crate::storage::{FileStore, MemoryStore, StorageConfig};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    fn memory_store() -> (Arc<MemoryStore>, DeckStore) {
        let backend = Arc::new(MemoryStore::new());
        let store = DeckStore::new(backend.clone());
        (backend, store)
    }

    fn new_match(opponent: &str, wins: u32, losses: u32) -> NewMatch {
        NewMatch {
            opponent_deck: opponent.to_string(),
            game_wins: wins,
            game_losses: losses,
            notes: None,
        }
    }

    /// Backend whose writes always fail.
    struct ReadOnlyStore {
        inner: MemoryStore,
    }

    #[async_trait]
    impl KeyValueStore for ReadOnlyStore {
        fn name(&self) -> &'static str {
            "read-only"
        }

        async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key).await
        }

        async fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Backend("disk full".to_string()))
        }
    }

    #[tokio::test]
    async fn test_get_decks_empty_when_never_written() {
        let (_, store) = memory_store();
        assert!(store.get_decks().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_then_get_roundtrip() {
        let (_, store) = memory_store();
        let mut deck = Deck::new("Mono Red", "Standard");
        deck.add_match(Match::new("Esper", 2, 1));

        store.save_deck(&deck).await.unwrap();
        let decks = store.get_decks().await.unwrap();

        assert_eq!(decks.len(), 1);
        assert_eq!(decks[0], deck);
    }

    #[tokio::test]
    async fn test_save_replaces_in_place_and_appends_new() {
        let (_, store) = memory_store();
        let mut first = Deck::new("First", "Standard");
        let second = Deck::new("Second", "Standard");
        store.save_deck(&first).await.unwrap();
        store.save_deck(&second).await.unwrap();

        first.name = "First (renamed)".to_string();
        store.save_deck(&first).await.unwrap();

        let decks = store.get_decks().await.unwrap();
        assert_eq!(decks.len(), 2);
        assert_eq!(decks[0].name, "First (renamed)");
        assert_eq!(decks[1].name, "Second");
    }

    #[tokio::test]
    async fn test_get_deck_not_found_is_none() {
        let (_, store) = memory_store();
        assert!(store.get_deck("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_legacy_records_are_migrated_on_read_not_on_disk() {
        let (backend, store) = memory_store();
        let legacy = json!([{
            "id": "legacy-1",
            "name": "Old Burn",
            "format": "Modern",
            "createdAt": "2023-06-01T12:00:00.000Z",
            "cards": { "lightning bolt": { "card": { "name": "Lightning Bolt" }, "quantity": 4 } }
        }]);
        backend.set(DECKS_KEY, &legacy.to_string()).await.unwrap();

        let deck = store.get_deck("legacy-1").await.unwrap().unwrap();
        assert_eq!(deck.cards.main["lightning bolt"].quantity, 4);
        assert!(deck.versions.is_empty());

        // Storage keeps the legacy shape until the deck is saved
        let stored: Value =
            serde_json::from_str(&backend.get(DECKS_KEY).await.unwrap().unwrap()).unwrap();
        assert!(stored[0]["cards"].get("main").is_none());

        store.save_deck(&deck).await.unwrap();
        let stored: Value =
            serde_json::from_str(&backend.get(DECKS_KEY).await.unwrap().unwrap()).unwrap();
        assert_eq!(stored[0]["cards"]["main"]["lightning bolt"]["quantity"], 4);
        assert_eq!(stored[0]["versions"], json!([]));
    }

    #[tokio::test]
    async fn test_undecodable_records_are_skipped_and_preserved() {
        let (backend, store) = memory_store();
        let raw = json!([
            { "id": "broken", "name": 42 },
            { "id": "ok", "name": "Fine", "createdAt": "2024-01-01T00:00:00Z" }
        ]);
        backend.set(DECKS_KEY, &raw.to_string()).await.unwrap();

        let decks = store.get_decks().await.unwrap();
        assert_eq!(decks.len(), 1);
        assert_eq!(decks[0].id, "ok");

        store.save_deck(&decks[0]).await.unwrap();
        let stored: Vec<Value> =
            serde_json::from_str(&backend.get(DECKS_KEY).await.unwrap().unwrap()).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0], json!({ "id": "broken", "name": 42 }));
    }

    #[tokio::test]
    async fn test_unreadable_collection_reads_empty_and_blocks_saves() {
        for blob in ["{not json", r#"{"id": "not-an-array"}"#] {
            let (backend, store) = memory_store();
            backend.set(DECKS_KEY, blob).await.unwrap();

            assert!(store.get_decks().await.unwrap().is_empty());
            assert!(store.get_deck("any").await.unwrap().is_none());

            let err = store.create_deck("Fresh", "Standard").await.unwrap_err();
            assert!(matches!(err, DeckError::Storage(StorageError::Json(_))));
            assert_eq!(backend.get(DECKS_KEY).await.unwrap().as_deref(), Some(blob));
        }
    }

    #[tokio::test]
    async fn test_failed_save_leaves_previous_value() {
        let inner = MemoryStore::new();
        let deck = Deck::new("Kept", "Standard");
        inner
            .set(DECKS_KEY, &serde_json::to_string(&vec![&deck]).unwrap())
            .await
            .unwrap();
        let store = DeckStore::new(Arc::new(ReadOnlyStore { inner }));

        let mut changed = deck.clone();
        changed.name = "Lost".to_string();
        let err = store.save_deck(&changed).await.unwrap_err();
        assert!(matches!(err, StorageError::Backend(_)));

        let decks = store.get_decks().await.unwrap();
        assert_eq!(decks[0].name, "Kept");
    }

    #[tokio::test]
    async fn test_file_backed_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let backend = Arc::new(FileStore::new(StorageConfig::new(
            temp_dir.path().to_path_buf(),
        )));
        let store = DeckStore::new(backend);

        let deck = store.create_deck("Gruul Aggro", "Pioneer").await.unwrap();
        store
            .add_match(deck.id.as_str(), new_match("Mono Blue", 2, 0))
            .await
            .unwrap();

        let reopened = DeckStore::new(Arc::new(FileStore::new(StorageConfig::new(
            temp_dir.path().to_path_buf(),
        ))));
        let loaded = reopened.get_deck(deck.id.as_str()).await.unwrap().unwrap();
        assert_eq!(loaded.matches.len(), 1);
        assert_eq!(loaded.matches[0].result(), MatchResult::Win);
    }

    #[tokio::test]
    async fn test_create_deck_requires_name() {
        let (_, store) = memory_store();
        let err = store.create_deck("   ", "Standard").await.unwrap_err();
        assert!(matches!(err, DeckError::Validation(_)));
        assert!(store.get_decks().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_edit_deck() {
        let (_, store) = memory_store();
        let deck = store.create_deck("Temp", "Standard").await.unwrap();

        let edited = store
            .edit_deck(deck.id.as_str(), Some("Final"), Some("Explorer"))
            .await
            .unwrap();
        assert_eq!(edited.name, "Final");
        assert_eq!(edited.format, "Explorer");

        let err = store
            .edit_deck(deck.id.as_str(), Some(""), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DeckError::Validation(_)));
    }

    #[tokio::test]
    async fn test_add_match_to_missing_deck() {
        let (_, store) = memory_store();
        let err = store
            .add_match("nope", new_match("Burn", 2, 0))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_add_match_prepends_and_derives_result() {
        let (_, store) = memory_store();
        let deck = store.create_deck("Elves", "Legacy").await.unwrap();

        store
            .add_match(deck.id.as_str(), new_match(" Mono Red ", 2, 1))
            .await
            .unwrap();
        let second = store
            .add_match(deck.id.as_str(), new_match("Delver", 0, 2))
            .await
            .unwrap();

        let loaded = store.get_deck(deck.id.as_str()).await.unwrap().unwrap();
        assert_eq!(loaded.matches[0].id, second.id);
        assert_eq!(loaded.matches[0].result(), MatchResult::Loss);
        assert_eq!(loaded.matches[1].opponent_deck, "Mono Red");
        assert_eq!(
            loaded.matches[1].opponent_deck_normalized(),
            Some("mono red")
        );
    }

    #[tokio::test]
    async fn test_empty_score_policy() {
        let (_, store) = memory_store();
        let deck = store.create_deck("Draws", "Standard").await.unwrap();
        let record = store
            .add_match(deck.id.as_str(), new_match("Mirror", 0, 0))
            .await
            .unwrap();
        assert_eq!(record.result(), MatchResult::Draw);

        let strict = DeckStore::new(Arc::new(MemoryStore::new())).with_allow_empty_score(false);
        let deck = strict.create_deck("Strict", "Standard").await.unwrap();
        let err = strict
            .add_match(deck.id.as_str(), new_match("Mirror", 0, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, DeckError::Validation(_)));
    }

    #[tokio::test]
    async fn test_edit_match_rederives_result_and_keeps_date() {
        let (_, store) = memory_store();
        let deck = store.create_deck("Burn", "Modern").await.unwrap();
        let original = store
            .add_match(deck.id.as_str(), new_match("Tron", 2, 0))
            .await
            .unwrap();

        let edited = store
            .edit_match(
                deck.id.as_str(),
                original.id.as_str(),
                MatchEdit {
                    game_wins: Some(1),
                    game_losses: Some(2),
                    opponent_deck: Some("Eldrazi Tron".to_string()),
                    notes: Some("flooded".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(edited.result(), MatchResult::Loss);
        assert_eq!(edited.date(), original.date());
        assert_eq!(edited.opponent_deck, "Eldrazi Tron");
        assert_eq!(edited.notes.as_deref(), Some("flooded"));

        // Partial edit keeps the other side of the score
        let edited = store
            .edit_match(
                deck.id.as_str(),
                original.id.as_str(),
                MatchEdit {
                    game_wins: Some(3),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(edited.score(), "3-2");
        assert_eq!(edited.result(), MatchResult::Win);
    }

    #[tokio::test]
    async fn test_edit_and_delete_missing_match() {
        let (_, store) = memory_store();
        let deck = store.create_deck("Burn", "Modern").await.unwrap();

        let err = store
            .edit_match(deck.id.as_str(), "ghost", MatchEdit::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DeckError::MatchNotFound { .. }));

        let err = store
            .delete_match(deck.id.as_str(), "ghost")
            .await
            .unwrap_err();
        assert!(matches!(err, DeckError::MatchNotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_match() {
        let (_, store) = memory_store();
        let deck = store.create_deck("Burn", "Modern").await.unwrap();
        let record = store
            .add_match(deck.id.as_str(), new_match("Tron", 2, 0))
            .await
            .unwrap();

        let removed = store
            .delete_match(deck.id.as_str(), record.id.as_str())
            .await
            .unwrap();
        assert_eq!(removed.id, record.id);

        let loaded = store.get_deck(deck.id.as_str()).await.unwrap().unwrap();
        assert!(loaded.matches.is_empty());
    }

    #[tokio::test]
    async fn test_save_cards_appends_versions_and_revert() {
        let (_, store) = memory_store();
        let deck = store.create_deck("Izzet", "Pioneer").await.unwrap();

        let mut cards = CardCollection::new();
        cards.add_card(Board::Main, Card::named("Opt"));
        let first = store
            .save_cards(deck.id.as_str(), Some("Izzet Phoenix"), cards.clone())
            .await
            .unwrap();

        cards.add_card(Board::Main, Card::named("Opt"));
        cards.add_card(Board::Side, Card::named("Abrade"));
        store
            .save_cards(deck.id.as_str(), None, cards)
            .await
            .unwrap();

        let loaded = store.get_deck(deck.id.as_str()).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Izzet Phoenix");
        assert_eq!(loaded.versions.len(), 2);
        assert_eq!(loaded.versions[0].cards.main["opt"].quantity, 1);
        assert_eq!(loaded.cards.main["opt"].quantity, 2);

        let reverted = store
            .revert_to_version(deck.id.as_str(), first.id.as_str())
            .await
            .unwrap();
        assert_eq!(reverted.cards.main["opt"].quantity, 1);
        assert!(reverted.cards.side.is_empty());
        assert_eq!(reverted.versions.len(), 2);

        let err = store
            .revert_to_version(deck.id.as_str(), "missing")
            .await
            .unwrap_err();
        assert!(matches!(err, DeckError::VersionNotFound { .. }));
    }

    #[tokio::test]
    async fn test_stale_snapshot_is_last_write_wins() {
        let (_, store) = memory_store();
        let deck = store.create_deck("Shared", "Standard").await.unwrap();

        let stale = store.get_deck(deck.id.as_str()).await.unwrap().unwrap();
        store
            .add_match(deck.id.as_str(), new_match("Burn", 2, 0))
            .await
            .unwrap();

        let mut overwrite = stale;
        overwrite.format = "Historic".to_string();
        store.save_deck(&overwrite).await.unwrap();

        let loaded = store.get_deck(deck.id.as_str()).await.unwrap().unwrap();
        assert_eq!(loaded.format, "Historic");
        assert!(loaded.matches.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_saves_of_different_decks_keep_both() {
        let (_, store) = memory_store();
        let store = Arc::new(store);
        let a = Deck::new("A", "Standard");
        let b = Deck::new("B", "Standard");

        let (ra, rb) = tokio::join!(store.save_deck(&a), store.save_deck(&b));
        ra.unwrap();
        rb.unwrap();

        assert_eq!(store.get_decks().await.unwrap().len(), 2);
    }
}
