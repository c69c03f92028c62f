//! Per-deck performance summary.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use super::win_rate;
use crate::models::{Match, MatchResult};

/// Shown in place of a date when nothing has been played.
pub const NOT_PLAYED: &str = "N/A";

/// Aggregate record and streaks for a set of matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSummary {
    pub total: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,

    /// Percentage, one decimal place
    pub win_rate: f64,

    /// Most recent match date; serialized as "N/A" when there is none
    #[serde(serialize_with = "serialize_last_played")]
    pub last_played: Option<DateTime<Utc>>,

    /// Wins in a row counting back from the most recent match
    pub current_streak: u32,

    pub best_win_streak: u32,
    pub worst_loss_streak: u32,
}

impl PerformanceSummary {
    /// Last played date as `YYYY-MM-DD`, or "N/A".
    pub fn last_played_label(&self) -> String {
        self.last_played
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| NOT_PLAYED.to_string())
    }
}

fn serialize_last_played<S>(
    value: &Option<DateTime<Utc>>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(date) => date.serialize(serializer),
        None => serializer.serialize_str(NOT_PLAYED),
    }
}

/// Summarize a match history.
///
/// Matches are ordered newest first by date before streaks are counted;
/// matches with the same date keep their input order. A draw ends both a
/// win streak and a loss streak.
pub fn summarize<'a, I>(matches: I) -> PerformanceSummary
where
    I: IntoIterator<Item = &'a Match>,
{
    let mut sorted: Vec<&Match> = matches.into_iter().collect();
    if sorted.is_empty() {
        return PerformanceSummary::default();
    }
    sorted.sort_by(|a, b| b.date().cmp(&a.date()));

    let count = |result: MatchResult| {
        sorted.iter().filter(|m| m.result() == result).count() as u32
    };
    let wins = count(MatchResult::Win);
    let losses = count(MatchResult::Loss);
    let draws = count(MatchResult::Draw);

    let mut best_win_streak = 0;
    let mut worst_loss_streak = 0;
    let mut win_run = 0;
    let mut loss_run = 0;
    for record in &sorted {
        match record.result() {
            MatchResult::Win => {
                win_run += 1;
                loss_run = 0;
            }
            MatchResult::Loss => {
                loss_run += 1;
                win_run = 0;
            }
            MatchResult::Draw => {
                win_run = 0;
                loss_run = 0;
            }
        }
        best_win_streak = best_win_streak.max(win_run);
        worst_loss_streak = worst_loss_streak.max(loss_run);
    }

    let current_streak = sorted
        .iter()
        .take_while(|m| m.result() == MatchResult::Win)
        .count() as u32;

    PerformanceSummary {
        total: sorted.len() as u32,
        wins,
        losses,
        draws,
        win_rate: win_rate(wins, losses, draws),
        last_played: Some(sorted[0].date()),
        current_streak,
        best_win_streak,
        worst_loss_streak,
    }
}
