use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::load_deck;
use crate::api::state::AppState;
use crate::api::ApiError;
use crate::calculate::{summarize, PerformanceSummary};
use crate::models::{Board, Deck, DeckId};

#[derive(Debug, Deserialize)]
pub struct CreateDeckRequest {
    pub name: String,
    #[serde(default)]
    pub format: String,
}

#[derive(Debug, Deserialize)]
pub struct EditDeckRequest {
    pub name: Option<String>,
    pub format: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckListItem {
    pub id: DeckId,
    pub name: String,
    pub format: String,
    pub created_at: DateTime<Utc>,
    pub main_count: u32,
    pub side_count: u32,
    pub summary: PerformanceSummary,
}

impl From<&Deck> for DeckListItem {
    fn from(deck: &Deck) -> Self {
        Self {
            id: deck.id.clone(),
            name: deck.name.clone(),
            format: deck.format.clone(),
            created_at: deck.created_at,
            main_count: deck.cards.count(Board::Main),
            side_count: deck.cards.count(Board::Side),
            summary: summarize(&deck.matches),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeckListResponse {
    pub decks: Vec<DeckListItem>,
}

pub async fn list_decks(State(state): State<AppState>) -> Result<Json<DeckListResponse>, ApiError> {
    let decks = state.decks.get_decks().await?;
    Ok(Json(DeckListResponse {
        decks: decks.iter().map(DeckListItem::from).collect(),
    }))
}

pub async fn create_deck(
    State(state): State<AppState>,
    Json(body): Json<CreateDeckRequest>,
) -> Result<(StatusCode, Json<Deck>), ApiError> {
    let deck = state.decks.create_deck(&body.name, &body.format).await?;
    Ok((StatusCode::CREATED, Json(deck)))
}

pub async fn get_deck(
    State(state): State<AppState>,
    Path(deck_id): Path<String>,
) -> Result<Json<Deck>, ApiError> {
    Ok(Json(load_deck(&state, &deck_id).await?))
}

pub async fn edit_deck(
    State(state): State<AppState>,
    Path(deck_id): Path<String>,
    Json(body): Json<EditDeckRequest>,
) -> Result<Json<Deck>, ApiError> {
    let deck = state
        .decks
        .edit_deck(&deck_id, body.name.as_deref(), body.format.as_deref())
        .await?;
    Ok(Json(deck))
}

pub async fn deck_summary(
    State(state): State<AppState>,
    Path(deck_id): Path<String>,
) -> Result<Json<PerformanceSummary>, ApiError> {
    let deck = load_deck(&state, &deck_id).await?;
    Ok(Json(summarize(&deck.matches)))
}
