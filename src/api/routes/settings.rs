use axum::extract::State;
use axum::Json;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::Settings;

pub async fn get_settings(State(state): State<AppState>) -> Json<Settings> {
    Json(state.settings.load().await)
}

pub async fn put_settings(
    State(state): State<AppState>,
    Json(body): Json<Settings>,
) -> Result<Json<Settings>, ApiError> {
    state.settings.save(&body).await?;
    Ok(Json(body))
}
