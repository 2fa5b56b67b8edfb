// Info interactor - Resolves a video and projects it to the info contract

use std::sync::Arc;

use serde::Serialize;
use tokio::time::timeout;
use tracing::info;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// Basic information about a video
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoInfo {
    pub title: String,
    /// Whole seconds, rounded down
    pub duration: u64,
    pub thumbnail: Option<String>,
    pub author: String,
}

impl From<MediaMetadata> for VideoInfo {
    fn from(metadata: MediaMetadata) -> Self {
        Self {
            title: metadata.title,
            duration: metadata.duration.max(0.0).floor() as u64,
            thumbnail: metadata.thumbnail,
            author: metadata.author,
        }
    }
}

/// Interactor for the video info use case
pub struct InfoInteractor {
    resolver: Arc<dyn SourceResolver>,
    settings: Arc<PipelineSettings>,
}

impl InfoInteractor {
    pub fn new(resolver: Arc<dyn SourceResolver>, settings: Arc<PipelineSettings>) -> Self {
        Self { resolver, settings }
    }

    /// Resolve `video_id` (an id or a watch URL)
    pub async fn execute(&self, video_id: &str) -> Result<VideoInfo, PipelineError> {
        if video_id.trim().is_empty() {
            return Err(PipelineError::Validation("videoId is required".to_string()));
        }
        let source = self.settings.descriptor(video_id)?;

        let metadata = timeout(self.settings.resolve_timeout, self.resolver.resolve(&source))
            .await
            .map_err(|_| PipelineError::Timeout {
                stage: "resolve",
                seconds: self.settings.resolve_timeout.as_secs(),
            })??;

        info!(video_id = %source.id(), title = %metadata.title, "Video info fetched");
        Ok(metadata.into())
    }
}
