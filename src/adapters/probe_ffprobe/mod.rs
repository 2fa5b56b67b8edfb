//! FFprobe adapter for artifact probing
//!
//! Reads the container duration and the stream types of a finished artifact.

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;

use super::process::{run_command, stderr_tail, Capture, FFPROBE};
use crate::domain::errors::*;
use crate::domain::rules::ProbeReport;
use crate::ports::*;

/// FFprobe-based probe adapter
#[derive(Debug, Default)]
pub struct FfprobeAdapter;

impl FfprobeAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    format: Option<ProbeFormat>,
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    // ffprobe prints numbers as strings
    #[serde(default)]
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    #[serde(default)]
    codec_type: Option<String>,
}

fn parse_report(json: &[u8]) -> Result<ProbeReport, PipelineError> {
    let output: ProbeOutput = serde_json::from_slice(json).map_err(|e| {
        PipelineError::TranscodeFailed(format!("Could not parse ffprobe output: {}", e))
    })?;

    let has_type = |kind: &str| {
        output
            .streams
            .iter()
            .any(|s| s.codec_type.as_deref() == Some(kind))
    };

    Ok(ProbeReport {
        duration_seconds: output
            .format
            .as_ref()
            .and_then(|f| f.duration.as_deref())
            .and_then(|d| d.parse::<f64>().ok()),
        has_video: has_type("video"),
        has_audio: has_type("audio"),
    })
}

#[async_trait]
impl ProbePort for FfprobeAdapter {
    async fn probe(&self, path: &Path) -> Result<ProbeReport, PipelineError> {
        let res = run_command(
            FFPROBE,
            |cmd| {
                cmd.args(["-v", "error"])
                    .args(["-show_entries", "format=duration:stream=codec_type"])
                    .args(["-of", "json"])
                    .arg(path)
            },
            Capture::STDOUT | Capture::STDERR,
        )
        .await
        .map_err(|e| PipelineError::TranscodeFailed(format!("Failed to run ffprobe: {}", e)))?;

        if !res.status.success() {
            return Err(PipelineError::TranscodeFailed(format!(
                "ffprobe could not read the artifact: {}",
                stderr_tail(&res.stderr, 3)
            )));
        }

        parse_report(&res.stdout)
    }
}
