//! Decks and their append-only version history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CardCollection, DeckId, EntityId, Match, MatchResult, VersionId};

/// An immutable snapshot of a deck's cards at the time of a deck-builder save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckVersion {
    pub id: VersionId,

    /// When the snapshot was taken
    pub timestamp: DateTime<Utc>,

    #[serde(default)]
    pub cards: CardCollection,
}

impl DeckVersion {
    /// Snapshot the given cards now.
    pub fn snapshot(cards: &CardCollection) -> Self {
        Self {
            id: EntityId::generate(),
            timestamp: Utc::now(),
            cards: cards.clone(),
        }
    }
}

/// A user's deck: cards, match history and edit history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    /// Unique identifier
    pub id: DeckId,

    /// Display name
    pub name: String,

    /// Play format (free text, e.g. "Standard", "Pauper")
    #[serde(default)]
    pub format: String,

    /// When the deck was created
    #[serde(default)]
    pub created_at: DateTime<Utc>,

    /// Match history, most recent first by convention
    #[serde(default)]
    pub matches: Vec<Match>,

    /// Current card list
    #[serde(default)]
    pub cards: CardCollection,

    /// Deck-builder snapshots, oldest first; never edited or removed
    #[serde(default)]
    pub versions: Vec<DeckVersion>,
}

impl Deck {
    /// Create a new, empty deck.
    pub fn new(name: &str, format: &str) -> Self {
        Self {
            id: EntityId::generate(),
            name: name.trim().to_string(),
            format: format.trim().to_string(),
            created_at: Utc::now(),
            matches: Vec::new(),
            cards: CardCollection::default(),
            versions: Vec::new(),
        }
    }

    /// Get a match by ID.
    pub fn find_match(&self, match_id: &str) -> Option<&Match> {
        self.matches.iter().find(|m| m.id == match_id)
    }

    pub fn find_match_mut(&mut self, match_id: &str) -> Option<&mut Match> {
        self.matches.iter_mut().find(|m| m.id == match_id)
    }

    /// Record a match. New matches go to the front of the history.
    pub fn add_match(&mut self, record: Match) {
        self.matches.insert(0, record);
    }

    /// Delete a match, returning it if it existed.
    pub fn remove_match(&mut self, match_id: &str) -> Option<Match> {
        let index = self.matches.iter().position(|m| m.id == match_id)?;
        Some(self.matches.remove(index))
    }

    /// Matches with the given result, or all matches when `filter` is `None`.
    pub fn matches_with_result(&self, filter: Option<MatchResult>) -> Vec<&Match> {
        self.matches
            .iter()
            .filter(|m| filter.map_or(true, |r| m.result() == r))
            .collect()
    }

    /// Replace the card list and append a snapshot of it to the history.
    /// Entries are re-keyed by card name before the snapshot is taken.
    pub fn commit_cards(&mut self, mut cards: CardCollection) -> &DeckVersion {
        cards.normalize_keys();
        cards.prune_empty();
        self.cards = cards;
        self.versions.push(DeckVersion::snapshot(&self.cards));
        &self.versions[self.versions.len() - 1]
    }

    /// Get a version by ID.
    pub fn find_version(&self, version_id: &str) -> Option<&DeckVersion> {
        self.versions.iter().find(|v| v.id == version_id)
    }

    /// Most recent snapshot, if any.
    pub fn latest_version(&self) -> Option<&DeckVersion> {
        self.versions.last()
    }

    /// Restore the card list from a snapshot. The history is left as is.
    pub fn revert_to_version(&mut self, version_id: &str) -> bool {
        match self.find_version(version_id) {
            Some(version) => {
                self.cards = version.cards.clone();
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Board, Card, CardEntry};

    fn deck_with_cards() -> Deck {
        let mut deck = Deck::new("Izzet Phoenix", "Pioneer");
        let mut cards = CardCollection::new();
        cards.add_card(Board::Main, Card::named("Arclight Phoenix"));
        cards.add_card(Board::Main, Card::named("Arclight Phoenix"));
        deck.commit_cards(cards);
        deck
    }

    #[test]
    fn test_new_deck_is_empty() {
        let deck = Deck::new("  Mono Green ", "Standard");
        assert_eq!(deck.name, "Mono Green");
        assert!(deck.matches.is_empty());
        assert!(deck.cards.is_empty());
        assert!(deck.versions.is_empty());
    }

    #[test]
    fn test_add_match_prepends() {
        let mut deck = Deck::new("Burn", "Modern");
        let first = Match::new("Tron", 2, 0);
        let second = Match::new("Jund", 0, 2);
        let second_id = second.id.clone();

        deck.add_match(first);
        deck.add_match(second);

        assert_eq!(deck.matches[0].id, second_id);
        assert_eq!(deck.matches.len(), 2);
    }

    #[test]
    fn test_remove_match() {
        let mut deck = Deck::new("Burn", "Modern");
        let m = Match::new("Tron", 2, 0);
        let id = m.id.clone();
        deck.add_match(m);

        assert!(deck.remove_match(id.as_str()).is_some());
        assert!(deck.remove_match(id.as_str()).is_none());
        assert!(deck.matches.is_empty());
    }

    #[test]
    fn test_matches_with_result() {
        let mut deck = Deck::new("Burn", "Modern");
        deck.add_match(Match::new("Tron", 2, 0));
        deck.add_match(Match::new("Jund", 0, 2));
        deck.add_match(Match::new("Elves", 2, 1));

        assert_eq!(deck.matches_with_result(None).len(), 3);
        assert_eq!(deck.matches_with_result(Some(MatchResult::Win)).len(), 2);
        assert_eq!(deck.matches_with_result(Some(MatchResult::Draw)).len(), 0);
    }

    #[test]
    fn test_commit_cards_merges_keys_differing_in_case() {
        let mut deck = Deck::new("Burn", "Modern");
        let mut cards = CardCollection::new();
        cards.main.insert(
            "Lightning Bolt".to_string(),
            CardEntry::new(Card::named("Lightning Bolt"), 2),
        );
        cards.main.insert(
            "lightning bolt".to_string(),
            CardEntry::new(Card::named("lightning bolt"), 3),
        );

        let version = deck.commit_cards(cards);
        assert_eq!(version.cards.main.len(), 1);
        assert_eq!(version.cards.main["lightning bolt"].quantity, 5);
        assert_eq!(deck.cards.count(Board::Main), 5);
    }

    #[test]
    fn test_commit_cards_appends_version() {
        let mut deck = deck_with_cards();
        assert_eq!(deck.versions.len(), 1);
        assert_eq!(deck.versions[0].cards, deck.cards);

        let mut cards = deck.cards.clone();
        cards.add_card(Board::Side, Card::named("Negate"));
        deck.commit_cards(cards);

        assert_eq!(deck.versions.len(), 2);
        // Earlier snapshot untouched
        assert!(deck.versions[0].cards.side.is_empty());
        assert_eq!(deck.latest_version().unwrap().cards.side.len(), 1);
    }

    #[test]
    fn test_revert_to_version_restores_cards_only() {
        let mut deck = deck_with_cards();
        let first_version = deck.versions[0].id.clone();

        let mut cards = deck.cards.clone();
        cards.clear();
        deck.commit_cards(cards);
        assert!(deck.cards.is_empty());

        assert!(deck.revert_to_version(first_version.as_str()));
        assert_eq!(deck.cards.count(Board::Main), 2);
        assert_eq!(deck.versions.len(), 2);

        assert!(!deck.revert_to_version("missing"));
    }

    #[test]
    fn test_deck_serialization_roundtrip() {
        let mut deck = deck_with_cards();
        deck.add_match(Match::new("Rakdos", 2, 1).with_notes("close game 3"));

        let json = serde_json::to_string(&deck).unwrap();
        assert!(json.contains("\"createdAt\""));
        let deserialized: Deck = serde_json::from_str(&json).unwrap();
        assert_eq!(deck, deserialized);
    }
}
