//! YouTube Data API v3 search adapter

use std::collections::HashMap;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::ports::*;
use crate::utils::time::parse_iso8601_duration;

pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// Keyword search through the YouTube Data API
#[derive(Debug, Clone)]
pub struct YouTubeApiSearch {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl YouTubeApiSearch {
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_API_BASE)
    }

    pub fn with_base_url(api_key: Option<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn get<T: DeserializeOwned>(
        &self,
        resource: &str,
        query: &[(&str, String)],
    ) -> Result<T, SearchError> {
        let url = format!("{}/{}", self.base_url, resource);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| SearchError::Backend(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Backend(format!(
                "{} returned {}: {}",
                resource,
                status,
                api_error_message(&body).unwrap_or(body)
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| SearchError::Backend(format!("invalid {} response: {}", resource, e)))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchListResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
    next_page_token: Option<String>,
    prev_page_token: Option<String>,
    page_info: Option<PageInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    #[serde(default)]
    total_results: u64,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    channel_title: String,
    #[serde(default)]
    thumbnails: HashMap<String, Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    id: String,
    content_details: Option<ContentDetails>,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    duration: Option<String>,
}

fn api_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value["error"]["message"].as_str().map(str::to_string)
}

/// Join search hits with their durations, matched by video id
fn merge_results(search: SearchListResponse, details: VideoListResponse) -> SearchPage {
    let durations: HashMap<String, u64> = details
        .items
        .into_iter()
        .filter_map(|item| {
            let duration = item.content_details?.duration?;
            Some((item.id, parse_iso8601_duration(&duration).unwrap_or(0)))
        })
        .collect();

    let hits = search
        .items
        .into_iter()
        .filter_map(|item| {
            let id = item.id.video_id?;
            let mut thumbnails = item.snippet.thumbnails;
            let thumbnail = thumbnails
                .remove("medium")
                .or_else(|| thumbnails.remove("default"))
                .map(|t| t.url);
            Some(SearchHit {
                duration_seconds: durations.get(&id).copied().unwrap_or(0),
                id,
                title: item.snippet.title,
                thumbnail,
                channel: item.snippet.channel_title,
            })
        })
        .collect();

    SearchPage {
        hits,
        next_page_token: search.next_page_token,
        prev_page_token: search.prev_page_token,
        total_results: search.page_info.map(|p| p.total_results).unwrap_or(0),
    }
}

#[async_trait]
impl VideoSearchPort for YouTubeApiSearch {
    async fn search(&self, query: &SearchQuery) -> Result<SearchPage, SearchError> {
        let api_key = self.api_key.clone().ok_or(SearchError::NotConfigured)?;

        let mut params = vec![
            ("part", "snippet".to_string()),
            ("q", query.query.clone()),
            ("maxResults", query.max_results.to_string()),
            ("type", "video".to_string()),
            ("videoDuration", "medium".to_string()),
            ("key", api_key.clone()),
        ];
        if let Some(token) = &query.page_token {
            params.push(("pageToken", token.clone()));
        }
        let search: SearchListResponse = self.get("search", &params).await?;

        let ids: Vec<&str> = search
            .items
            .iter()
            .filter_map(|item| item.id.video_id.as_deref())
            .collect();
        let details = if ids.is_empty() {
            VideoListResponse { items: Vec::new() }
        } else {
            let params = vec![
                ("part", "contentDetails".to_string()),
                ("id", ids.join(",")),
                ("key", api_key),
            ];
            self.get("videos", &params).await?
        };

        Ok(merge_results(search, details))
    }
}
