use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use crate::app::VideoInfo;
use crate::http::{ApiError, AppState, Result};

pub fn route() -> Router<AppState> {
    Router::new().route("/api/video/info", get(info))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InfoQuery {
    video_id: Option<String>,
}

async fn info(State(state): State<AppState>, Query(query): Query<InfoQuery>) -> Result<Json<VideoInfo>> {
    let video_id = query
        .video_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Video ID is required"))?;

    let info = state
        .info
        .execute(&video_id)
        .await
        .map_err(ApiError::lookup)?;
    Ok(Json(info))
}
