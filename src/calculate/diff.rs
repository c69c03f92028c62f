//! Card differences between two deck snapshots.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::models::{Card, CardCollection, CardMap};

/// A card and a change in copies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardDelta {
    pub card: Card,
    pub quantity: u32,
}

/// What changed in one board.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CardDiff {
    pub added: Vec<CardDelta>,
    pub removed: Vec<CardDelta>,
}

impl CardDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// What changed across main deck and sideboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeckDiff {
    pub main: CardDiff,
    pub side: CardDiff,
}

impl DeckDiff {
    pub fn is_empty(&self) -> bool {
        self.main.is_empty() && self.side.is_empty()
    }
}

/// Compare two boards key by key.
///
/// A key missing on one side counts as zero copies there. Additions carry the
/// current card reference, removals the previous one. Output is ordered by
/// card key.
pub fn diff_cards(previous: &CardMap, current: &CardMap) -> CardDiff {
    let keys: BTreeSet<&String> = previous.keys().chain(current.keys()).collect();
    let mut diff = CardDiff::default();

    for key in keys {
        let before = previous.get(key);
        let after = current.get(key);
        let prev_qty = before.map_or(0, |e| e.quantity);
        let curr_qty = after.map_or(0, |e| e.quantity);

        if curr_qty > prev_qty {
            if let Some(entry) = after {
                diff.added.push(CardDelta {
                    card: entry.card.clone(),
                    quantity: curr_qty - prev_qty,
                });
            }
        } else if prev_qty > curr_qty {
            if let Some(entry) = before {
                diff.removed.push(CardDelta {
                    card: entry.card.clone(),
                    quantity: prev_qty - curr_qty,
                });
            }
        }
    }

    diff
}

/// Compare main deck and sideboard separately.
pub fn diff_collections(previous: &CardCollection, current: &CardCollection) -> DeckDiff {
    DeckDiff {
        main: diff_cards(&previous.main, &current.main),
        side: diff_cards(&previous.side, &current.side),
    }
}
