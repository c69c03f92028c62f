//! Cross-deck statistics for the collection overview.

use serde::Serialize;

use super::{summarize, win_rate};
use crate::models::{Deck, DeckId, Match};

/// Number of recent matches shown by default.
pub const DEFAULT_RECENT_LIMIT: usize = 5;

/// One deck's record in the overview.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckRate {
    pub deck_id: DeckId,
    pub name: String,
    pub matches: u32,
    pub win_rate: f64,
}

/// A match tagged with the deck it was played with.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentMatch {
    pub deck_id: DeckId,
    pub deck_name: String,
    #[serde(rename = "match")]
    pub record: Match,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionOverview {
    pub deck_count: u32,
    pub total: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,

    /// `None` when no match has been played with any deck
    pub win_rate: Option<f64>,

    pub decks: Vec<DeckRate>,

    /// Highest win rate among decks with at least one match
    pub best_deck: Option<DeckRate>,

    /// Lowest win rate among decks with at least one match
    pub worst_deck: Option<DeckRate>,

    /// Newest matches across all decks
    pub recent_matches: Vec<RecentMatch>,
}

/// Build the overview for a deck collection.
///
/// Ties for best or worst deck go to the deck listed first.
pub fn overview(decks: &[Deck], recent_limit: usize) -> CollectionOverview {
    let mut result = CollectionOverview {
        deck_count: decks.len() as u32,
        ..Default::default()
    };

    for deck in decks {
        let summary = summarize(&deck.matches);
        result.wins += summary.wins;
        result.losses += summary.losses;
        result.draws += summary.draws;
        result.decks.push(DeckRate {
            deck_id: deck.id.clone(),
            name: deck.name.clone(),
            matches: summary.total,
            win_rate: summary.win_rate,
        });
    }
    result.total = result.wins + result.losses + result.draws;
    if result.total > 0 {
        result.win_rate = Some(win_rate(result.wins, result.losses, result.draws));
    }

    let played: Vec<&DeckRate> = result.decks.iter().filter(|d| d.matches > 0).collect();
    result.best_deck = played
        .iter()
        .copied()
        .fold(None, |best: Option<&DeckRate>, d| match best {
            Some(b) if b.win_rate >= d.win_rate => Some(b),
            _ => Some(d),
        })
        .cloned();
    result.worst_deck = played
        .iter()
        .copied()
        .fold(None, |worst: Option<&DeckRate>, d| match worst {
            Some(w) if w.win_rate <= d.win_rate => Some(w),
            _ => Some(d),
        })
        .cloned();

    result.recent_matches = recent_matches(decks, recent_limit);
    result
}

/// The newest `limit` matches across every deck.
pub fn recent_matches(decks: &[Deck], limit: usize) -> Vec<RecentMatch> {
    let mut all: Vec<(&Deck, &Match)> = decks
        .iter()
        .flat_map(|deck| deck.matches.iter().map(move |m| (deck, m)))
        .collect();
    all.sort_by(|a, b| b.1.date().cmp(&a.1.date()));

    all.into_iter()
        .take(limit)
        .map(|(deck, record)| RecentMatch {
            deck_id: deck.id.clone(),
            deck_name: deck.name.clone(),
            record: record.clone(),
        })
        .collect()
}
