// Search interactor - Keyword search projected to the search contract

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::ports::*;
use crate::utils::time::format_clock;

/// Hits shorter than this are dropped
pub const MIN_DURATION_SECS: u64 = 60;
pub const DEFAULT_MAX_RESULTS: u32 = 12;
/// Upper bound accepted by the search API
pub const MAX_RESULTS_LIMIT: u32 = 50;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub id: String,
    pub title: String,
    pub thumbnail: Option<String>,
    pub channel: String,
    /// `m:ss`
    pub duration: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    pub results: Vec<SearchResult>,
    pub next_page_token: Option<String>,
    pub prev_page_token: Option<String>,
    pub total_results: u64,
}

impl From<SearchPage> for SearchResults {
    fn from(page: SearchPage) -> Self {
        let results = page
            .hits
            .into_iter()
            .filter(|hit| hit.duration_seconds >= MIN_DURATION_SECS)
            .map(|hit| SearchResult {
                duration: format_clock(hit.duration_seconds),
                id: hit.id,
                title: hit.title,
                thumbnail: hit.thumbnail,
                channel: hit.channel,
            })
            .collect();

        Self {
            results,
            next_page_token: page.next_page_token,
            prev_page_token: page.prev_page_token,
            total_results: page.total_results,
        }
    }
}

/// Interactor for the video search use case
pub struct SearchInteractor {
    search: Arc<dyn VideoSearchPort>,
}

impl SearchInteractor {
    pub fn new(search: Arc<dyn VideoSearchPort>) -> Self {
        Self { search }
    }

    pub async fn execute(
        &self,
        query: &str,
        max_results: Option<u32>,
        page_token: Option<String>,
    ) -> Result<SearchResults, SearchError> {
        let query = SearchQuery {
            query: query.trim().to_string(),
            max_results: max_results
                .unwrap_or(DEFAULT_MAX_RESULTS)
                .clamp(1, MAX_RESULTS_LIMIT),
            page_token: page_token.filter(|token| !token.is_empty()),
        };
        debug!(query = %query.query, max_results = query.max_results, "Searching videos");

        let page = self.search.search(&query).await?;
        let hits = page.hits.len();
        let results = SearchResults::from(page);

        info!(
            query = %query.query,
            hits,
            kept = results.results.len(),
            "Search completed"
        );
        Ok(results)
    }
}
