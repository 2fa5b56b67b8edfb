// Probe LibAV adapter - Artifact analysis using libav

use std::path::Path;

use async_trait::async_trait;
use ffmpeg_next as ffmpeg;
use tokio::task;

use crate::domain::errors::*;
use crate::domain::rules::ProbeReport;
use crate::ports::*;

/// LibAV-based probe adapter
#[derive(Debug)]
pub struct ProbeLibavAdapter;

impl ProbeLibavAdapter {
    /// Initialize libav once for the process
    pub fn new() -> Result<Self, PipelineError> {
        ffmpeg::init().map_err(|e| {
            PipelineError::TranscodeFailed(format!("Failed to initialize libav: {}", e))
        })?;
        Ok(Self)
    }
}

#[async_trait]
impl ProbePort for ProbeLibavAdapter {
    async fn probe(&self, path: &Path) -> Result<ProbeReport, PipelineError> {
        let path = path.to_path_buf();

        task::spawn_blocking(move || {
            let context = ffmpeg::format::input(&path).map_err(|e| {
                PipelineError::TranscodeFailed(format!(
                    "libav could not open {}: {}",
                    path.display(),
                    e
                ))
            })?;

            let duration = context.duration();
            let duration_seconds = (duration > 0)
                .then(|| duration as f64 / f64::from(ffmpeg::ffi::AV_TIME_BASE));
            let has_type = |kind| context.streams().best(kind).is_some();

            Ok(ProbeReport {
                duration_seconds,
                has_video: has_type(ffmpeg::media::Type::Video),
                has_audio: has_type(ffmpeg::media::Type::Audio),
            })
        })
        .await
        .map_err(|e| PipelineError::TranscodeFailed(format!("probe task failed: {}", e)))?
    }
}
