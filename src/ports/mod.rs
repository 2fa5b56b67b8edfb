// Ports - Interface definitions (contracts)

use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::ProbeReport;

/// Bytes of a remote stream; a terminal `Err` may carry a [`PipelineError`]
/// (see [`PipelineError::from_io`])
pub type ByteStream = BoxStream<'static, std::io::Result<Bytes>>;

/// Port turning a video identifier into metadata and readable streams
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SourceResolver: Send + Sync {
    /// Fetch title, duration and the available encodings
    async fn resolve(&self, source: &SourceDescriptor) -> Result<MediaMetadata, PipelineError>;

    /// Open the bytes of one encoding previously returned by `resolve`
    async fn open_stream(
        &self,
        source: &SourceDescriptor,
        option: &EncodingOption,
    ) -> Result<ByteStream, PipelineError>;
}

/// Options of one extraction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractOptions {
    pub container: Container,
    /// Drop every video stream
    pub audio_only: bool,
    pub audio_bitrate_kbps: u32,
}

/// Port for cutting a window out of a local media file
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SegmentExtractor: Send + Sync {
    /// Write `[window.start, window.end)` of `input` to `output`.
    ///
    /// On failure no partial file is left at `output`.
    async fn extract(
        &self,
        input: &Path,
        output: &Path,
        window: &TrimWindow,
        options: &ExtractOptions,
    ) -> Result<(), PipelineError>;

    /// Whether the backend can produce this container
    async fn supports(&self, _container: Container) -> bool {
        true
    }
}

/// Port for inspecting a finished artifact
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProbePort: Send + Sync {
    async fn probe(&self, path: &Path) -> Result<ProbeReport, PipelineError>;
}

/// Keyword search request
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub query: String,
    pub max_results: u32,
    pub page_token: Option<String>,
}

/// One search hit, duration in seconds (0 when unknown)
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub id: String,
    pub title: String,
    pub thumbnail: Option<String>,
    pub channel: String,
    pub duration_seconds: u64,
}

/// One page of search hits
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPage {
    pub hits: Vec<SearchHit>,
    pub next_page_token: Option<String>,
    pub prev_page_token: Option<String>,
    pub total_results: u64,
}

/// Failure of a search backend
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SearchError {
    /// No API key configured
    #[error("YouTube API key not configured")]
    NotConfigured,

    #[error("Search request failed: {0}")]
    Backend(String),
}

/// Port for keyword search over the video provider
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VideoSearchPort: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<SearchPage, SearchError>;
}
