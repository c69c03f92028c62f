//! Card references and deck card collections.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A card record as returned by the external card-search provider.
///
/// Only `name` is interpreted here. Everything else, including fields this
/// struct does not know about, is carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Card {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_line: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_uris: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_faces: Option<Value>,

    /// Provider fields not modelled above
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Card {
    /// Create a bare card reference with just a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Key used to deduplicate this card within a deck.
    pub fn key(&self) -> String {
        card_key(&self.name)
    }
}

/// Normalize a card name into a collection key.
pub fn card_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// One card slot in a board: the card reference and how many copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardEntry {
    #[serde(default)]
    pub card: Card,

    #[serde(default)]
    pub quantity: u32,
}

impl CardEntry {
    pub fn new(card: Card, quantity: u32) -> Self {
        Self { card, quantity }
    }
}

/// Card key → entry. Ordered so snapshots serialize and diff deterministically.
pub type CardMap = BTreeMap<String, CardEntry>;

/// Which half of a deck a card lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Board {
    Main,
    Side,
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Board::Main => write!(f, "main"),
            Board::Side => write!(f, "side"),
        }
    }
}

impl FromStr for Board {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "main" | "maindeck" => Ok(Board::Main),
            "side" | "sideboard" => Ok(Board::Side),
            other => Err(format!("unknown board: {}", other)),
        }
    }
}

/// A deck's cards, partitioned into main deck and sideboard.
///
/// No entry ever has a quantity of zero: taking the last copy out of a board
/// deletes the key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardCollection {
    #[serde(default)]
    pub main: CardMap,

    #[serde(default)]
    pub side: CardMap,
}

impl CardCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn board(&self, board: Board) -> &CardMap {
        match board {
            Board::Main => &self.main,
            Board::Side => &self.side,
        }
    }

    fn board_mut(&mut self, board: Board) -> &mut CardMap {
        match board {
            Board::Main => &mut self.main,
            Board::Side => &mut self.side,
        }
    }

    /// Add one copy of a card, keyed by its lower-cased name.
    /// Returns the new quantity.
    pub fn add_card(&mut self, board: Board, card: Card) -> u32 {
        let key = card.key();
        let entry = self
            .board_mut(board)
            .entry(key)
            .or_insert_with(|| CardEntry::new(card, 0));
        entry.quantity += 1;
        entry.quantity
    }

    /// Set the quantity of an existing entry. Zero removes it.
    /// Returns `false` if the key is not in the board.
    pub fn set_quantity(&mut self, board: Board, key: &str, quantity: u32) -> bool {
        let cards = self.board_mut(board);
        if !cards.contains_key(key) {
            return false;
        }
        if quantity == 0 {
            cards.remove(key);
        } else if let Some(entry) = cards.get_mut(key) {
            entry.quantity = quantity;
        }
        true
    }

    /// Take one copy out. Returns the remaining quantity, or `None` if absent.
    pub fn remove_one(&mut self, board: Board, key: &str) -> Option<u32> {
        let cards = self.board_mut(board);
        let remaining = {
            let entry = cards.get_mut(key)?;
            entry.quantity = entry.quantity.saturating_sub(1);
            entry.quantity
        };
        if remaining == 0 {
            cards.remove(key);
        }
        Some(remaining)
    }

    /// Remove every copy of a card.
    pub fn remove_card(&mut self, board: Board, key: &str) -> Option<CardEntry> {
        self.board_mut(board).remove(key)
    }

    /// Move one copy of a card between boards.
    /// Returns `false` if the source board does not hold the card.
    pub fn move_one(&mut self, from: Board, to: Board, key: &str) -> bool {
        if from == to {
            return self.board(from).contains_key(key);
        }
        let Some(card) = self.board(from).get(key).map(|e| e.card.clone()) else {
            return false;
        };
        self.remove_one(from, key);
        self.board_mut(to)
            .entry(key.to_string())
            .or_insert_with(|| CardEntry::new(card, 0))
            .quantity += 1;
        true
    }

    pub fn clear(&mut self) {
        self.main.clear();
        self.side.clear();
    }

    /// Total copies in one board.
    pub fn count(&self, board: Board) -> u32 {
        self.board(board).values().map(|e| e.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.main.is_empty() && self.side.is_empty()
    }

    /// Drop any zero-quantity entries. Returns how many were dropped.
    pub fn prune_empty(&mut self) -> usize {
        let before = self.main.len() + self.side.len();
        self.main.retain(|_, e| e.quantity > 0);
        self.side.retain(|_, e| e.quantity > 0);
        before - (self.main.len() + self.side.len())
    }

    /// Re-key every entry by its card's name, summing entries that collide.
    /// Entries whose card has no name keep their key, normalized.
    pub fn normalize_keys(&mut self) {
        for cards in [&mut self.main, &mut self.side] {
            let mut merged = CardMap::new();
            for (old_key, entry) in std::mem::take(cards) {
                let key = if entry.card.name.trim().is_empty() {
                    card_key(&old_key)
                } else {
                    entry.card.key()
                };
                match merged.get_mut(&key) {
                    Some(existing) => {
                        existing.quantity = existing.quantity.saturating_add(entry.quantity)
                    }
                    None => {
                        merged.insert(key, entry);
                    }
                }
            }
            *cards = merged;
        }
    }
}
