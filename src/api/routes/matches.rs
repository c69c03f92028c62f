use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::load_deck;
use crate::api::state::AppState;
use crate::api::ApiError;
use crate::calculate::{normalize_opponent_stats, opponent_suggestions, sorted_by_games};
use crate::models::{Match, MatchResult};
use crate::storage::{MatchEdit, NewMatch};

#[derive(Debug, Deserialize)]
pub struct ListMatchesParams {
    pub result: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MatchListResponse {
    pub matches: Vec<Match>,
}

pub async fn list_matches(
    State(state): State<AppState>,
    Path(deck_id): Path<String>,
    Query(params): Query<ListMatchesParams>,
) -> Result<Json<MatchListResponse>, ApiError> {
    let filter = match params.result.as_deref() {
        None | Some("") | Some("all") => None,
        Some(value) => Some(value.parse::<MatchResult>().map_err(ApiError::BadRequest)?),
    };

    let deck = load_deck(&state, &deck_id).await?;
    let matches = deck
        .matches_with_result(filter)
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(MatchListResponse { matches }))
}

pub async fn add_match(
    State(state): State<AppState>,
    Path(deck_id): Path<String>,
    Json(body): Json<NewMatch>,
) -> Result<(StatusCode, Json<Match>), ApiError> {
    let record = state.decks.add_match(&deck_id, body).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn edit_match(
    State(state): State<AppState>,
    Path((deck_id, match_id)): Path<(String, String)>,
    Json(body): Json<MatchEdit>,
) -> Result<Json<Match>, ApiError> {
    Ok(Json(state.decks.edit_match(&deck_id, &match_id, body).await?))
}

pub async fn delete_match(
    State(state): State<AppState>,
    Path((deck_id, match_id)): Path<(String, String)>,
) -> Result<Json<Match>, ApiError> {
    Ok(Json(state.decks.delete_match(&deck_id, &match_id).await?))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchupEntry {
    pub display_name: String,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub total: u32,
    pub win_rate: f64,
}

#[derive(Debug, Serialize)]
pub struct MatchupResponse {
    pub matchups: Vec<MatchupEntry>,
}

/// Record against each opponent deck, most played first.
pub async fn matchups(
    State(state): State<AppState>,
    Path(deck_id): Path<String>,
) -> Result<Json<MatchupResponse>, ApiError> {
    let deck = load_deck(&state, &deck_id).await?;
    let matchups = sorted_by_games(normalize_opponent_stats(&deck.matches))
        .into_iter()
        .map(|stat| MatchupEntry {
            total: stat.total(),
            win_rate: stat.win_rate(),
            display_name: stat.display_name,
            wins: stat.wins,
            losses: stat.losses,
            draws: stat.draws,
        })
        .collect();
    Ok(Json(MatchupResponse { matchups }))
}

#[derive(Debug, Deserialize)]
pub struct SuggestionParams {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct SuggestionResponse {
    pub suggestions: Vec<String>,
}

pub async fn suggestions(
    State(state): State<AppState>,
    Path(deck_id): Path<String>,
    Query(params): Query<SuggestionParams>,
) -> Result<Json<SuggestionResponse>, ApiError> {
    let deck = load_deck(&state, &deck_id).await?;
    let suggestions = opponent_suggestions(
        &deck.matches,
        &params.q,
        state.config.matches.suggestion_limit,
    );
    Ok(Json(SuggestionResponse { suggestions }))
}
