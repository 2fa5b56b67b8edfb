use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::warn;

use crate::domain::errors::PipelineError;
use crate::ports::SearchError;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Pipeline {
        summary: &'static str,
        source: PipelineError,
    },
    Search(SearchError),
}

impl ApiError {
    pub fn bad_request<T>(t: T) -> Self
    where
        T: ToString,
    {
        ApiError::BadRequest(t.to_string())
    }

    /// Failure of a trim job, summarized by the error's own user message
    pub fn pipeline(source: PipelineError) -> Self {
        ApiError::Pipeline {
            summary: source.user_message(),
            source,
        }
    }

    /// Failure while looking a video up
    pub fn lookup(source: PipelineError) -> Self {
        let summary = if source.is_validation() {
            source.user_message()
        } else {
            "Failed to fetch video information"
        };
        ApiError::Pipeline { summary, source }
    }
}

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        ApiError::Search(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(err) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": err }))).into_response()
            }
            ApiError::NotFound(err) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": err }))).into_response()
            }
            ApiError::Pipeline { summary, source } => {
                let status = if source.is_validation() {
                    StatusCode::BAD_REQUEST
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                };
                let body = json!({
                    "error": summary,
                    "details": source.to_string(),
                    "kind": source.kind(),
                });
                (status, Json(body)).into_response()
            }
            ApiError::Search(SearchError::NotConfigured) => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "error": SearchError::NotConfigured.to_string(),
                    "message": "Please add YOUTUBE_API_KEY to your .env file",
                })),
            )
                .into_response(),
            ApiError::Search(err) => {
                warn!("Search failed: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": "Failed to search videos",
                        "details": err.to_string(),
                    })),
                )
                    .into_response()
            }
        }
    }
}
