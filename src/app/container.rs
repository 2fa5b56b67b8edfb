use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::adapters::{AppConfig, FfmpegExtractor, YouTubeApiSearch, YtDlpResolver};
use crate::app::{
    info_interactor::InfoInteractor, search_interactor::SearchInteractor,
    trim_interactor::TrimInteractor,
};
use crate::domain::model::PipelineSettings;
use crate::ports::{ProbePort, SegmentExtractor, SourceResolver, VideoSearchPort};

pub trait AppContainer: Send + Sync {
    fn trim_interactor(&self) -> Arc<TrimInteractor>;
    fn info_interactor(&self) -> Arc<InfoInteractor>;
    fn search_interactor(&self) -> Arc<SearchInteractor>;
    fn settings(&self) -> Arc<PipelineSettings>;
}

pub struct DefaultAppContainer {
    trim_interactor: Arc<TrimInteractor>,
    info_interactor: Arc<InfoInteractor>,
    search_interactor: Arc<SearchInteractor>,
    settings: Arc<PipelineSettings>,
}

impl DefaultAppContainer {
    /// Wire the production adapters from configuration
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let settings = Arc::new(config.pipeline_settings()?);

        let resolver = Arc::new(YtDlpResolver::detect(config.provider.user_agent.clone()).await);
        let extractor = Arc::new(FfmpegExtractor::new());
        let search = Arc::new(YouTubeApiSearch::new(config.provider.youtube_api_key.clone()));
        if !search.is_configured() {
            warn!("YOUTUBE_API_KEY not set, search is disabled");
        }

        let probe = if settings.verify_output {
            default_probe()
        } else {
            None
        };

        info!(
            downloads_dir = %settings.downloads_dir.display(),
            max_concurrent_jobs = settings.max_concurrent_jobs,
            verify_output = probe.is_some(),
            "Application container initialized"
        );

        Ok(Self::from_parts(
            resolver as Arc<dyn SourceResolver>,
            extractor as Arc<dyn SegmentExtractor>,
            probe,
            search as Arc<dyn VideoSearchPort>,
            settings,
        ))
    }

    /// Wire arbitrary port implementations
    pub fn from_parts(
        resolver: Arc<dyn SourceResolver>,
        extractor: Arc<dyn SegmentExtractor>,
        probe: Option<Arc<dyn ProbePort>>,
        search: Arc<dyn VideoSearchPort>,
        settings: Arc<PipelineSettings>,
    ) -> Self {
        let trim_interactor = Arc::new(TrimInteractor::new(
            Arc::clone(&resolver),
            extractor,
            probe,
            Arc::clone(&settings),
        ));
        let info_interactor = Arc::new(InfoInteractor::new(resolver, Arc::clone(&settings)));
        let search_interactor = Arc::new(SearchInteractor::new(search));

        Self {
            trim_interactor,
            info_interactor,
            search_interactor,
            settings,
        }
    }
}

#[cfg(feature = "libav")]
fn default_probe() -> Option<Arc<dyn ProbePort>> {
    match crate::adapters::ProbeLibavAdapter::new() {
        Ok(probe) => Some(Arc::new(probe)),
        Err(e) => {
            warn!("libav unavailable, falling back to ffprobe: {}", e);
            Some(Arc::new(crate::adapters::FfprobeAdapter::new()))
        }
    }
}

#[cfg(not(feature = "libav"))]
fn default_probe() -> Option<Arc<dyn ProbePort>> {
    Some(Arc::new(crate::adapters::FfprobeAdapter::new()))
}

impl AppContainer for DefaultAppContainer {
    fn trim_interactor(&self) -> Arc<TrimInteractor> {
        Arc::clone(&self.trim_interactor)
    }

    fn info_interactor(&self) -> Arc<InfoInteractor> {
        Arc::clone(&self.info_interactor)
    }

    fn search_interactor(&self) -> Arc<SearchInteractor> {
        Arc::clone(&self.search_interactor)
    }

    fn settings(&self) -> Arc<PipelineSettings> {
        Arc::clone(&self.settings)
    }
}
