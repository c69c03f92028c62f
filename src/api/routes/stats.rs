use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::calculate::{overview, CollectionOverview, DEFAULT_RECENT_LIMIT};

#[derive(Debug, Deserialize)]
pub struct StatsParams {
    pub recent: Option<usize>,
}

/// Totals, best and worst deck, and recent matches across the collection.
pub async fn collection_stats(
    State(state): State<AppState>,
    Query(params): Query<StatsParams>,
) -> Result<Json<CollectionOverview>, ApiError> {
    let decks = state.decks.get_decks().await?;
    let recent = params.recent.unwrap_or(DEFAULT_RECENT_LIMIT).min(50);
    Ok(Json(overview(&decks, recent)))
}
