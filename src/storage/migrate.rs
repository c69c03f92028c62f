//! Schema migration for stored decks.
//!
//! Decks written by older releases come in several shapes:
//! - `cards` as a flat `key → {card, quantity}` map with no main/side split
//! - no `cards` at all
//! - no `versions` (or `matches`) list
//!
//! Every read runs the stored JSON through [`migrate_deck_value`] before
//! decoding, so callers only ever see the current shape. Nothing is written
//! back here; the canonical form reaches disk the next time the deck is saved.
//! Migrating an already-canonical deck changes nothing.

use serde_json::{Map, Value};

use crate::models::Deck;

const MAIN: &str = "main";
const SIDE: &str = "side";

/// Bring one stored deck to the current shape.
///
/// Non-object input is returned unchanged; decoding will reject it.
pub fn migrate_deck_value(value: Value) -> Value {
    let Value::Object(mut deck) = value else {
        return value;
    };

    let cards = normalize_cards(deck.remove("cards"));
    deck.insert("cards".to_string(), cards);

    let matches = match deck.remove("matches") {
        Some(Value::Array(matches)) => Value::Array(matches),
        _ => Value::Array(Vec::new()),
    };
    deck.insert("matches".to_string(), matches);

    let versions = match deck.remove("versions") {
        Some(Value::Array(versions)) => versions.into_iter().map(migrate_version).collect(),
        _ => Vec::new(),
    };
    deck.insert("versions".to_string(), Value::Array(versions));

    Value::Object(deck)
}

/// Migrate and decode one stored deck.
pub fn migrate_deck(value: Value) -> Result<Deck, serde_json::Error> {
    serde_json::from_value(migrate_deck_value(value))
}

fn migrate_version(value: Value) -> Value {
    let Value::Object(mut version) = value else {
        return value;
    };
    let cards = normalize_cards(version.remove("cards"));
    version.insert("cards".to_string(), cards);
    Value::Object(version)
}

/// Turn any historical `cards` value into `{ main: {...}, side: {...} }`.
fn normalize_cards(cards: Option<Value>) -> Value {
    let (main, side) = match cards {
        Some(Value::Object(map)) if is_partitioned(&map) => {
            let mut map = map;
            (take_board(&mut map, MAIN), take_board(&mut map, SIDE))
        }
        Some(Value::Object(flat)) => (flat, Map::new()),
        _ => (Map::new(), Map::new()),
    };

    let mut partitioned = Map::new();
    partitioned.insert(MAIN.to_string(), Value::Object(prune_board(main)));
    partitioned.insert(SIDE.to_string(), Value::Object(prune_board(side)));
    Value::Object(partitioned)
}

/// A partitioned collection only has `main`/`side` keys, and those hold
/// boards rather than card entries. A card entry carries a numeric
/// `quantity`; a board may hold a card keyed `"quantity"`.
fn is_partitioned(map: &Map<String, Value>) -> bool {
    !map.is_empty()
        && map.iter().all(|(key, value)| {
            (key == MAIN || key == SIDE)
                && matches!(value, Value::Object(board) if !is_card_entry(board))
        })
}

fn is_card_entry(entry: &Map<String, Value>) -> bool {
    matches!(entry.get("quantity"), Some(Value::Number(_)))
}

fn take_board(map: &mut Map<String, Value>, key: &str) -> Map<String, Value> {
    match map.remove(key) {
        Some(Value::Object(board)) => board,
        _ => Map::new(),
    }
}

/// Drop entries without a positive quantity and coerce whole-number floats.
fn prune_board(board: Map<String, Value>) -> Map<String, Value> {
    board
        .into_iter()
        .filter_map(|(key, entry)| {
            let Value::Object(mut entry) = entry else {
                return None;
            };
            let quantity = entry.get("quantity").and_then(quantity_of)?;
            if quantity == 0 {
                return None;
            }
            entry.insert("quantity".to_string(), Value::from(quantity));
            Some((key, Value::Object(entry)))
        })
        .collect()
}

/// Stored quantity as a `u32`, saturating values too large to hold.
fn quantity_of(value: &Value) -> Option<u32> {
    value
        .as_u64()
        .or_else(|| {
            value
                .as_f64()
                .filter(|q| q.is_finite() && *q >= 0.0 && q.fract() == 0.0)
                .map(|q| q as u64)
        })
        .map(|q| u32::try_from(q).unwrap_or(u32::MAX))
}
