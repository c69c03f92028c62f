//! Opponent name normalization and matchup grouping.
//!
//! Opponent deck names are free text, so "Mono Red", "mono red" and
//! " Mono Red " must land in one bucket. Grouping uses the trimmed,
//! lower-cased name; display uses the first spelling seen.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;

use super::win_rate;
use crate::models::{Match, MatchResult};

/// Bucket for matches with no opponent name.
pub const UNKNOWN_OPPONENT: &str = "Unknown";

/// Record against one opponent deck.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpponentStat {
    /// First spelling of the opponent name encountered
    pub display_name: String,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}

impl OpponentStat {
    fn new(display_name: String) -> Self {
        Self {
            display_name,
            wins: 0,
            losses: 0,
            draws: 0,
        }
    }

    fn record(&mut self, result: MatchResult) {
        match result {
            MatchResult::Win => self.wins += 1,
            MatchResult::Loss => self.losses += 1,
            MatchResult::Draw => self.draws += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.wins + self.losses + self.draws
    }

    pub fn win_rate(&self) -> f64 {
        win_rate(self.wins, self.losses, self.draws)
    }
}

/// Display name and grouping key for an opponent name.
fn opponent_key(opponent_deck: &str) -> (String, String) {
    let trimmed = opponent_deck.trim();
    let display = if trimmed.is_empty() {
        UNKNOWN_OPPONENT
    } else {
        trimmed
    };
    (display.to_string(), display.to_lowercase())
}

/// Group matches by opponent, in order of first appearance.
pub fn normalize_opponent_stats<'a, I>(matches: I) -> Vec<OpponentStat>
where
    I: IntoIterator<Item = &'a Match>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut stats: Vec<OpponentStat> = Vec::new();

    for record in matches {
        let (display, key) = opponent_key(&record.opponent_deck);
        let slot = *index.entry(key).or_insert_with(|| {
            stats.push(OpponentStat::new(display));
            stats.len() - 1
        });
        stats[slot].record(record.result());
    }

    stats
}

/// Order matchups by number of matches played, most first. Ties keep their
/// existing order.
pub fn sorted_by_games(mut stats: Vec<OpponentStat>) -> Vec<OpponentStat> {
    stats.sort_by(|a, b| b.total().cmp(&a.total()));
    stats
}

/// Previously used opponent names containing `query`, for autocompletion.
///
/// Matching is case-insensitive; each opponent appears once, spelled as first
/// seen. A blank query suggests nothing.
pub fn opponent_suggestions<'a, I>(matches: I, query: &str, limit: usize) -> Vec<String>
where
    I: IntoIterator<Item = &'a Match>,
{
    let needle = query.trim().to_lowercase();
    if needle.is_empty() || limit == 0 {
        return Vec::new();
    }

    let mut seen: HashSet<String> = HashSet::new();
    let mut names = Vec::new();
    for record in matches {
        let trimmed = record.opponent_deck.trim();
        if trimmed.is_empty() {
            continue;
        }
        let key = trimmed.to_lowercase();
        if !seen.insert(key.clone()) {
            continue;
        }
        if key.contains(&needle) {
            names.push(trimmed.to_string());
            if names.len() == limit {
                break;
            }
        }
    }
    names
}

/// Group matches by the UTC calendar day they were played.
pub fn group_matches_by_date<'a, I>(matches: I) -> BTreeMap<NaiveDate, Vec<&'a Match>>
where
    I: IntoIterator<Item = &'a Match>,
{
    let mut groups: BTreeMap<NaiveDate, Vec<&'a Match>> = BTreeMap::new();
    for record in matches {
        groups
            .entry(record.date().date_naive())
            .or_default()
            .push(record);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_case_and_whitespace_variants_group_together() {
        let matches = vec![
            Match::new("Mono Red", 2, 0),
            Match::new("mono red", 0, 2),
            Match::new(" Mono Red ", 1, 1),
        ];

        let stats = normalize_opponent_stats(&matches);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].display_name, "Mono Red");
        assert_eq!((stats[0].wins, stats[0].losses, stats[0].draws), (1, 1, 1));
    }

    #[test]
    fn test_display_name_is_first_encountered() {
        let mut first = Match::new("x", 2, 0);
        // Bypass trimming to check the raw-name path
        first.opponent_deck = "  mono RED".to_string();
        let matches = vec![first, Match::new("Mono Red", 2, 0)];

        let stats = normalize_opponent_stats(&matches);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].display_name, "mono RED");
        assert_eq!(stats[0].wins, 2);
    }

    #[test]
    fn test_blank_names_collapse_to_unknown() {
        let matches = vec![
            Match::new("", 2, 0),
            Match::new("   ", 0, 2),
            Match::new("Esper", 2, 1),
        ];

        let stats = normalize_opponent_stats(&matches);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].display_name, UNKNOWN_OPPONENT);
        assert_eq!(stats[0].total(), 2);
        assert_eq!(stats[1].display_name, "Esper");
    }

    #[test]
    fn test_literal_unknown_shares_bucket() {
        let matches = vec![Match::new("", 2, 0), Match::new("unknown", 2, 0)];
        let stats = normalize_opponent_stats(&matches);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].wins, 2);
    }

    #[test]
    fn test_each_match_counts_once() {
        let matches = vec![
            Match::new("Burn", 2, 0),
            Match::new("Tron", 0, 2),
            Match::new("Burn", 1, 1),
            Match::new("Tron", 2, 1),
        ];

        let stats = normalize_opponent_stats(&matches);
        let counted: u32 = stats.iter().map(OpponentStat::total).sum();
        assert_eq!(counted, 4);
        assert_eq!(stats[0].win_rate(), 50.0);
        assert_eq!(stats[1].win_rate(), 50.0);
    }

    #[test]
    fn test_sorted_by_games() {
        let matches = vec![
            Match::new("Rare", 2, 0),
            Match::new("Common", 2, 0),
            Match::new("Common", 0, 2),
        ];

        let sorted = sorted_by_games(normalize_opponent_stats(&matches));
        assert_eq!(sorted[0].display_name, "Common");
        assert_eq!(sorted[1].display_name, "Rare");
    }

    #[test]
    fn test_opponent_suggestions() {
        let matches = vec![
            Match::new("Rakdos Midrange", 2, 0),
            Match::new("rakdos midrange", 2, 0),
            Match::new("Rakdos Sacrifice", 0, 2),
            Match::new("Azorius Control", 2, 1),
            Match::new("", 2, 1),
        ];

        assert_eq!(
            opponent_suggestions(&matches, "RAKDOS", 5),
            vec!["Rakdos Midrange".to_string(), "Rakdos Sacrifice".to_string()]
        );
        assert_eq!(opponent_suggestions(&matches, "ol", 5), vec!["Azorius Control"]);
        assert_eq!(opponent_suggestions(&matches, "rakdos", 1).len(), 1);
        assert!(opponent_suggestions(&matches, "  ", 5).is_empty());
    }

    #[test]
    fn test_group_matches_by_date() {
        let day1_morning = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let day1_evening = Utc.with_ymd_and_hms(2024, 5, 1, 21, 0, 0).unwrap();
        let day2 = Utc.with_ymd_and_hms(2024, 5, 2, 12, 0, 0).unwrap();
        let matches = vec![
            Match::played_at("A", 2, 0, day1_morning),
            Match::played_at("B", 2, 0, day2),
            Match::played_at("C", 2, 0, day1_evening),
        ];

        let groups = group_matches_by_date(&matches);
        assert_eq!(groups.len(), 2);
        let may_first = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(groups[&may_first].len(), 2);
    }
}
