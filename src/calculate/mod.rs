//! Statistics calculation engine.
//!
//! Computes derived metrics from stored match and card data:
//! - Match results from game scores
//! - Win rates, streaks and per-deck summaries
//! - Opponent matchups grouped by normalized deck name
//! - Card differences between deck versions
//! - Cross-deck overview

mod diff;
mod normalize;
mod overview;
mod summary;

pub use diff::*;
pub use normalize::*;
pub use overview::*;
pub use summary::*;

use crate::models::MatchResult;

/// Derive a match result from games won and lost.
pub fn derive_result(wins: u32, losses: u32) -> MatchResult {
    MatchResult::from_games(wins, losses)
}

/// Win percentage rounded to one decimal place. Zero matches is `0.0`.
pub fn win_rate(wins: u32, losses: u32, draws: u32) -> f64 {
    let total = wins + losses + draws;
    if total == 0 {
        0.0
    } else {
        round_to_tenth(wins as f64 / total as f64 * 100.0)
    }
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
