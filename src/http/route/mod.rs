use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use super::{ApiError, AppState};

pub mod download;
pub mod player;
pub mod search;
pub mod video;

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "message": "InkCut backend server is running",
        "youtubeApiConfigured": state.youtube_api_configured,
    }))
}

pub async fn frontend_missing() -> ApiError {
    ApiError::NotFound("Frontend not found".to_string())
}
