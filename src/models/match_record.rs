//! Match records: one best-of-N set against an opponent's deck.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EntityId, MatchId};

/// Outcome of a match, derived from the game score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchResult {
    Win,
    Loss,
    Draw,
}

impl MatchResult {
    /// Derive the outcome from games won and lost.
    ///
    /// Equal scores are a draw, including 0-0.
    pub fn from_games(wins: u32, losses: u32) -> Self {
        if wins > losses {
            MatchResult::Win
        } else if losses > wins {
            MatchResult::Loss
        } else {
            MatchResult::Draw
        }
    }
}

impl std::fmt::Display for MatchResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchResult::Win => write!(f, "win"),
            MatchResult::Loss => write!(f, "loss"),
            MatchResult::Draw => write!(f, "draw"),
        }
    }
}

impl std::str::FromStr for MatchResult {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "win" | "w" => Ok(MatchResult::Win),
            "loss" | "l" => Ok(MatchResult::Loss),
            "draw" | "d" => Ok(MatchResult::Draw),
            other => Err(format!("unknown result: {}", other)),
        }
    }
}

/// A recorded match.
///
/// `result` is a cache of [`MatchResult::from_games`] over the score and is
/// recomputed whenever the score changes, including when a record is read
/// back from storage. There is no way to set it directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredMatch")]
pub struct Match {
    pub id: MatchId,

    /// Opponent deck name as the user typed it (trimmed)
    pub opponent_deck: String,

    /// Lower-cased opponent name, used only for grouping
    #[serde(default, skip_serializing_if = "Option::is_none")]
    opponent_deck_normalized: Option<String>,

    game_wins: u32,

    game_losses: u32,

    result: MatchResult,

    /// When the match was recorded; never changes after creation
    date: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// On-disk shape of a match. Older records may lack the score or carry a
/// result that disagrees with it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredMatch {
    id: MatchId,
    #[serde(default)]
    opponent_deck: Option<String>,
    #[serde(default)]
    opponent_deck_normalized: Option<String>,
    #[serde(default)]
    game_wins: u32,
    #[serde(default)]
    game_losses: u32,
    date: DateTime<Utc>,
    #[serde(default)]
    notes: Option<String>,
}

impl From<StoredMatch> for Match {
    fn from(stored: StoredMatch) -> Self {
        Self {
            id: stored.id,
            opponent_deck: stored.opponent_deck.unwrap_or_default(),
            opponent_deck_normalized: stored.opponent_deck_normalized,
            game_wins: stored.game_wins,
            game_losses: stored.game_losses,
            result: MatchResult::from_games(stored.game_wins, stored.game_losses),
            date: stored.date,
            notes: stored.notes.filter(|n| !n.is_empty()),
        }
    }
}

impl Match {
    /// Record a new match played now.
    pub fn new(opponent_deck: &str, game_wins: u32, game_losses: u32) -> Self {
        Self::played_at(opponent_deck, game_wins, game_losses, Utc::now())
    }

    /// Record a match with an explicit date.
    pub fn played_at(
        opponent_deck: &str,
        game_wins: u32,
        game_losses: u32,
        date: DateTime<Utc>,
    ) -> Self {
        let mut record = Self {
            id: EntityId::generate(),
            opponent_deck: String::new(),
            opponent_deck_normalized: None,
            game_wins,
            game_losses,
            result: MatchResult::from_games(game_wins, game_losses),
            date,
            notes: None,
        };
        record.set_opponent(opponent_deck);
        record
    }

    /// Builder method to attach notes. Blank notes are dropped.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.set_notes(Some(notes.into()));
        self
    }

    pub fn game_wins(&self) -> u32 {
        self.game_wins
    }

    pub fn game_losses(&self) -> u32 {
        self.game_losses
    }

    /// Grouping key for the opponent, absent on records saved before it existed.
    pub fn opponent_deck_normalized(&self) -> Option<&str> {
        self.opponent_deck_normalized.as_deref()
    }

    pub fn result(&self) -> MatchResult {
        self.result
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    /// Update the score and re-derive the result.
    pub fn set_score(&mut self, game_wins: u32, game_losses: u32) {
        self.game_wins = game_wins;
        self.game_losses = game_losses;
        self.result = MatchResult::from_games(game_wins, game_losses);
    }

    /// Update the opponent name and its grouping key.
    pub fn set_opponent(&mut self, opponent_deck: &str) {
        let trimmed = opponent_deck.trim();
        self.opponent_deck = trimmed.to_string();
        self.opponent_deck_normalized = Some(trimmed.to_lowercase());
    }

    pub fn set_notes(&mut self, notes: Option<String>) {
        self.notes = notes.filter(|n| !n.trim().is_empty());
    }

    /// Score formatted as `wins-losses`.
    pub fn score(&self) -> String {
        format!("{}-{}", self.game_wins, self.game_losses)
    }
}
