use axum::extract::Path;
use axum::response::Html;
use axum::routing::get;
use axum::Router;

use crate::domain::model::is_valid_video_id;
use crate::http::{ApiError, AppState, Result};

const PLAYER_TEMPLATE: &str = include_str!("player.html");
const VIDEO_ID_PLACEHOLDER: &str = "{{VIDEO_ID}}";

pub fn route() -> Router<AppState> {
    Router::new().route("/api/player/:video_id", get(player))
}

/// Embedded YouTube player page talking to its parent through `postMessage`
pub fn render_player(video_id: &str) -> Option<String> {
    is_valid_video_id(video_id).then(|| PLAYER_TEMPLATE.replace(VIDEO_ID_PLACEHOLDER, video_id))
}

async fn player(Path(video_id): Path<String>) -> Result<Html<String>> {
    render_player(&video_id)
        .map(Html)
        .ok_or_else(|| ApiError::bad_request("Invalid video ID"))
}
