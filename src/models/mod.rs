//! Core data models for the deck tracker.

mod card;
mod deck;
mod ids;
mod match_record;
mod settings;

pub use card::*;
pub use deck::*;
pub use ids::*;
pub use match_record::*;
pub use settings::*;
