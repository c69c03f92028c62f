//! # Deck Tracker
//!
//! A local tracker for trading card game decks: match results, matchup
//! statistics and deck-builder version history.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (decks, matches, cards, versions, settings)
//! - **storage**: Key-value persistence, schema migration, deck repository
//! - **calculate**: Results, win rates, streaks, matchups and version diffs
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod api;
pub mod calculate;
pub mod config;
pub mod models;
pub mod storage;

pub use models::*;
