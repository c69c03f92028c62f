use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::load_deck;
use crate::api::state::AppState;
use crate::api::ApiError;
use crate::calculate::{diff_collections, DeckDiff};
use crate::models::{Board, CardCollection, Deck, DeckVersion, VersionId};

#[derive(Debug, Deserialize)]
pub struct SaveCardsRequest {
    pub name: Option<String>,
    #[serde(default)]
    pub cards: CardCollection,
}

/// Deck-builder save.
pub async fn save_cards(
    State(state): State<AppState>,
    Path(deck_id): Path<String>,
    Json(body): Json<SaveCardsRequest>,
) -> Result<Json<DeckVersion>, ApiError> {
    let version = state
        .decks
        .save_cards(&deck_id, body.name.as_deref(), body.cards)
        .await?;
    Ok(Json(version))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionSummary {
    pub id: VersionId,
    pub timestamp: DateTime<Utc>,
    pub main_count: u32,
    pub side_count: u32,
}

#[derive(Debug, Serialize)]
pub struct VersionListResponse {
    pub versions: Vec<VersionSummary>,
}

/// Versions oldest first.
pub async fn list_versions(
    State(state): State<AppState>,
    Path(deck_id): Path<String>,
) -> Result<Json<VersionListResponse>, ApiError> {
    let deck = load_deck(&state, &deck_id).await?;
    let versions = deck
        .versions
        .iter()
        .map(|v| VersionSummary {
            id: v.id.clone(),
            timestamp: v.timestamp,
            main_count: v.cards.count(Board::Main),
            side_count: v.cards.count(Board::Side),
        })
        .collect();
    Ok(Json(VersionListResponse { versions }))
}

#[derive(Debug, Deserialize)]
pub struct DiffParams {
    /// Version to compare against; the deck's current cards when absent
    pub against: Option<String>,
}

/// Changes from `version_id` to `against`.
pub async fn diff_version(
    State(state): State<AppState>,
    Path((deck_id, version_id)): Path<(String, String)>,
    Query(params): Query<DiffParams>,
) -> Result<Json<DeckDiff>, ApiError> {
    let deck = load_deck(&state, &deck_id).await?;
    let base = find_version(&deck, &version_id)?;
    let target = match params.against.as_deref() {
        Some(other) if !other.is_empty() => &find_version(&deck, other)?.cards,
        _ => &deck.cards,
    };
    Ok(Json(diff_collections(&base.cards, target)))
}

fn find_version<'a>(deck: &'a Deck, version_id: &str) -> Result<&'a DeckVersion, ApiError> {
    deck.find_version(version_id)
        .ok_or_else(|| ApiError::NotFound(format!("version {} in deck {}", version_id, deck.id)))
}

pub async fn revert_version(
    State(state): State<AppState>,
    Path((deck_id, version_id)): Path<(String, String)>,
) -> Result<Json<Deck>, ApiError> {
    Ok(Json(
        state.decks.revert_to_version(&deck_id, &version_id).await?,
    ))
}
