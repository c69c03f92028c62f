//! REST API endpoints.
//!
//! Axum-based HTTP API over the deck store: decks, matches, card versions,
//! cross-deck statistics and display settings.

pub mod routes;
pub mod state;

use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::storage::{DeckError, StorageError};
use state::AppState;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        error!("Storage failure: {}", e);
        ApiError::Internal(format!("could not access saved decks: {}", e))
    }
}

impl From<DeckError> for ApiError {
    fn from(e: DeckError) -> Self {
        match e {
            DeckError::Storage(inner) => inner.into(),
            DeckError::Validation(msg) => ApiError::BadRequest(msg),
            other => ApiError::NotFound(other.to_string()),
        }
    }
}

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origin == "*" {
        return layer.allow_origin(Any);
    }
    match origin.parse::<HeaderValue>() {
        Ok(value) => layer.allow_origin(value),
        Err(_) => {
            warn!("Invalid CORS origin {:?}, allowing any origin", origin);
            layer.allow_origin(Any)
        }
    }
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.cors_origin);

    Router::new()
        .route("/api/health", get(routes::health))
        .route(
            "/api/decks",
            get(routes::decks::list_decks).post(routes::decks::create_deck),
        )
        .route(
            "/api/decks/:deck_id",
            get(routes::decks::get_deck).put(routes::decks::edit_deck),
        )
        .route("/api/decks/:deck_id/summary", get(routes::decks::deck_summary))
        .route("/api/decks/:deck_id/matchups", get(routes::matches::matchups))
        .route(
            "/api/decks/:deck_id/matches",
            get(routes::matches::list_matches).post(routes::matches::add_match),
        )
        .route(
            "/api/decks/:deck_id/matches/:match_id",
            put(routes::matches::edit_match).delete(routes::matches::delete_match),
        )
        .route(
            "/api/decks/:deck_id/suggestions",
            get(routes::matches::suggestions),
        )
        .route("/api/decks/:deck_id/cards", put(routes::versions::save_cards))
        .route(
            "/api/decks/:deck_id/versions",
            get(routes::versions::list_versions),
        )
        .route(
            "/api/decks/:deck_id/versions/:version_id/diff",
            get(routes::versions::diff_version),
        )
        .route(
            "/api/decks/:deck_id/versions/:version_id/revert",
            post(routes::versions::revert_version),
        )
        .route("/api/stats", get(routes::stats::collection_stats))
        .route(
            "/api/settings",
            get(routes::settings::get_settings).put(routes::settings::put_settings),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
