use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use crate::app::SearchResults;
use crate::http::{ApiError, AppState, Result};
use crate::ports::SearchError;

pub fn route() -> Router<AppState> {
    Router::new().route("/api/search", get(search))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchParams {
    q: Option<String>,
    max_results: Option<String>,
    page_token: Option<String>,
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResults>> {
    let query = params
        .q
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Search query is required"))?;

    if !state.youtube_api_configured {
        return Err(SearchError::NotConfigured.into());
    }

    // Unparseable values fall back to the default page size
    let max_results = params.max_results.and_then(|v| v.trim().parse().ok());
    let results = state
        .search
        .execute(&query, max_results, params.page_token)
        .await?;
    Ok(Json(results))
}
