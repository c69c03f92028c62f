pub mod decks;
pub mod matches;
pub mod settings;
pub mod stats;
pub mod versions;

use axum::Json;
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::Deck;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Load a deck or fail with 404.
pub(crate) async fn load_deck(state: &AppState, deck_id: &str) -> Result<Deck, ApiError> {
    state
        .decks
        .get_deck(deck_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("deck {}", deck_id)))
}
