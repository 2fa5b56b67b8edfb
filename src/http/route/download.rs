use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Deserializer};

use crate::domain::model::{QualityTier, TrimRequest, TrimResult};
use crate::http::{ApiError, AppState, Result};

pub fn route() -> Router<AppState> {
    Router::new().route("/api/download", post(download))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadBody {
    pub video_id: Option<String>,
    #[serde(default, deserialize_with = "seconds")]
    pub start_time: Option<f64>,
    #[serde(default, deserialize_with = "seconds")]
    pub end_time: Option<f64>,
    pub quality: Option<String>,
    pub format: Option<String>,
    pub audio_only: Option<bool>,
}

/// Seconds sent either as a JSON number or as a numeric string
#[derive(Deserialize)]
#[serde(untagged)]
enum Seconds {
    Number(f64),
    Text(String),
}

fn seconds<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Seconds>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Seconds::Number(value)) => Ok(Some(value)),
        Some(Seconds::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(Seconds::Text(text)) => text
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid seconds value '{}'", text))),
    }
}

impl DownloadBody {
    fn into_request(self) -> Result<TrimRequest> {
        let (Some(video_id), Some(start), Some(end)) = (
            self.video_id.filter(|id| !id.trim().is_empty()),
            self.start_time,
            self.end_time,
        ) else {
            return Err(ApiError::bad_request(
                "videoId, startTime, and endTime are required",
            ));
        };

        let request = TrimRequest::new(&video_id, start, end)
            .map_err(ApiError::pipeline)?
            .with_quality(QualityTier::parse_or_highest(self.quality.as_deref()))
            .with_audio_only(self.audio_only.unwrap_or(false));
        Ok(match self.format {
            Some(format) if !format.trim().is_empty() => request.with_format(format),
            _ => request,
        })
    }
}

async fn download(
    State(state): State<AppState>,
    payload: std::result::Result<Json<DownloadBody>, JsonRejection>,
) -> Result<Json<TrimResult>> {
    let Json(body) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let request = body.into_request()?;

    let result = state
        .trim
        .execute(request)
        .await
        .map_err(ApiError::pipeline)?;
    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_are_rejected() {
        let body = DownloadBody {
            video_id: Some("abc123".to_string()),
            start_time: Some(10.0),
            ..DownloadBody::default()
        };
        assert!(matches!(body.into_request(), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_defaults_applied() {
        let body: DownloadBody =
            serde_json::from_str(r#"{"videoId": "abc123", "startTime": 0, "endTime": 15}"#).unwrap();
        let request = body.into_request().unwrap();

        assert_eq!(request.quality, QualityTier::Highest);
        assert_eq!(request.format, "mp4");
        assert!(!request.audio_only);
    }

    #[test]
    fn test_unknown_quality_means_highest() {
        let body: DownloadBody = serde_json::from_str(
            r#"{"videoId": "abc123", "startTime": 0, "endTime": 15, "quality": "4k", "format": "webm", "audioOnly": true}"#,
        )
        .unwrap();
        let request = body.into_request().unwrap();

        assert_eq!(request.quality, QualityTier::Highest);
        assert_eq!(request.format, "webm");
        assert!(request.audio_only);
    }

    #[test]
    fn test_times_accept_numeric_strings() {
        let body: DownloadBody = serde_json::from_str(
            r#"{"videoId": "abc123", "startTime": "10", "endTime": " 42.5 "}"#,
        )
        .unwrap();
        let request = body.into_request().unwrap();
        assert_eq!(request.window.start, 10.0);
        assert_eq!(request.window.end, 42.5);

        let blank: DownloadBody =
            serde_json::from_str(r#"{"videoId": "abc123", "startTime": "", "endTime": 5}"#).unwrap();
        assert!(matches!(blank.into_request(), Err(ApiError::BadRequest(_))));

        assert!(serde_json::from_str::<DownloadBody>(
            r#"{"videoId": "abc123", "startTime": "ten", "endTime": 5}"#
        )
        .is_err());
    }

    #[test]
    fn test_invalid_window_is_validation_error() {
        let body = DownloadBody {
            video_id: Some("abc123".to_string()),
            start_time: Some(40.0),
            end_time: Some(10.0),
            ..DownloadBody::default()
        };
        match body.into_request() {
            Err(ApiError::Pipeline { source, .. }) => assert!(source.is_validation()),
            other => panic!("unexpected: {:?}", other.map(|r| r.video_id)),
        }
    }
}
