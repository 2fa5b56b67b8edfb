//! FFmpeg execution adapter
//!
//! Cuts the requested window out of a local file with the `ffmpeg` executable.

use std::collections::HashSet;
use std::ffi::OsString;
use std::path::Path;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use super::process::{run_command, stderr_tail, Capture, FFMPEG, FFXXX_DEFAULT_ARGS};
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// FFmpeg-based segment extractor
#[derive(Debug, Default)]
pub struct FfmpegExtractor {
    /// Muxers reported by `ffmpeg -muxers`, `None` when the listing failed
    muxers: OnceCell<Option<HashSet<String>>>,
}

impl FfmpegExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    async fn muxers(&self) -> Option<&HashSet<String>> {
        self.muxers
            .get_or_init(|| async {
                match run_command(FFMPEG, |cmd| cmd.args(["-hide_banner", "-muxers"]), Capture::STDOUT)
                    .await
                {
                    Ok(res) if res.status.success() => {
                        Some(parse_muxers(&String::from_utf8_lossy(&res.stdout)))
                    }
                    Ok(res) => {
                        warn!("ffmpeg -muxers exited with {}", res.status);
                        None
                    }
                    Err(e) => {
                        warn!("Could not list ffmpeg muxers: {}", e);
                        None
                    }
                }
            })
            .await
            .as_ref()
    }
}

/// Arguments of one extraction, program name excluded
fn build_args(
    input: &Path,
    output: &Path,
    window: &TrimWindow,
    options: &ExtractOptions,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = FFXXX_DEFAULT_ARGS.iter().map(OsString::from).collect();
    args.push("-y".into());
    args.push("-ss".into());
    args.push(format!("{:.3}", window.start).into());
    args.push("-i".into());
    args.push(input.as_os_str().to_owned());
    args.push("-t".into());
    args.push(format!("{:.3}", window.duration()).into());

    if options.audio_only || options.container.is_audio_only() {
        args.push("-vn".into());
        args.push("-b:a".into());
        args.push(format!("{}k", options.audio_bitrate_kbps).into());
    }

    args.push("-f".into());
    args.push(options.container.muxer().into());
    args.push(output.as_os_str().to_owned());
    args
}

/// Muxer names from the `ffmpeg -muxers` table
fn parse_muxers(listing: &str) -> HashSet<String> {
    listing
        .lines()
        .skip_while(|line| line.trim() != "--")
        .skip(1)
        .filter_map(|line| {
            let mut columns = line.split_whitespace();
            let flags = columns.next()?;
            let names = columns.next()?;
            flags.contains('E').then_some(names)
        })
        .flat_map(|names| names.split(','))
        .map(str::to_string)
        .collect()
}

async fn remove_partial(output: &Path) {
    if let Err(e) = tokio::fs::remove_file(output).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Could not remove partial output {}: {}", output.display(), e);
        }
    }
}

#[async_trait]
impl SegmentExtractor for FfmpegExtractor {
    async fn extract(
        &self,
        input: &Path,
        output: &Path,
        window: &TrimWindow,
        options: &ExtractOptions,
    ) -> Result<(), PipelineError> {
        if !tokio::fs::try_exists(input).await.unwrap_or(false) {
            return Err(PipelineError::TranscodeFailed(format!(
                "input file is missing: {}",
                input.display()
            )));
        }

        let args = build_args(input, output, window, options);
        let res = match run_command(FFMPEG, |cmd| cmd.args(&args), Capture::STDERR).await {
            Ok(res) => res,
            Err(e) => {
                remove_partial(output).await;
                return Err(PipelineError::TranscodeFailed(format!(
                    "Failed to run ffmpeg: {}",
                    e
                )));
            }
        };

        if !res.status.success() {
            remove_partial(output).await;
            let tail = stderr_tail(&res.stderr, 5);
            return Err(PipelineError::TranscodeFailed(if tail.is_empty() {
                format!("ffmpeg exited with {}", res.status)
            } else {
                tail
            }));
        }

        let written = tokio::fs::metadata(output)
            .await
            .map(|m| m.len())
            .unwrap_or(0);
        if written == 0 {
            remove_partial(output).await;
            return Err(PipelineError::TranscodeFailed(
                "ffmpeg produced no output".to_string(),
            ));
        }

        debug!("ffmpeg wrote {} bytes to {}", written, output.display());
        Ok(())
    }

    async fn supports(&self, container: Container) -> bool {
        match self.muxers().await {
            Some(muxers) => muxers.contains(container.muxer()),
            // Unknown: let ffmpeg itself decide
            None => true,
        }
    }
}
