//! yt-dlp source resolver
//!
//! Resolves metadata with `yt-dlp -J` and streams the chosen format through
//! `yt-dlp -o -`. Falls back to `youtube-dl` when `yt-dlp` is not installed.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use tokio::io::AsyncReadExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};

use super::process::{self, run_command, Capture, YT_DL, YT_DLP};
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::{ByteStream, SourceResolver};

/// Interface for the [yt-dlp](https://github.com/yt-dlp/yt-dlp) program
#[derive(Debug, Clone)]
pub struct YtDlpResolver {
    program: &'static str,
    user_agent: Option<String>,
}

impl YtDlpResolver {
    /// Use whichever of `yt-dlp` and `youtube-dl` is reachable
    pub async fn detect(user_agent: Option<String>) -> Self {
        let program = if process::is_available(YT_DLP, "--version").await {
            YT_DLP
        } else if process::is_available(YT_DL, "--version").await {
            YT_DL
        } else {
            warn!("Neither yt-dlp nor youtube-dl found on PATH, resolving will fail");
            YT_DLP
        };
        debug!("Using {} as source resolver", program);
        Self::with_program(program, user_agent)
    }

    pub fn with_program(program: &'static str, user_agent: Option<String>) -> Self {
        Self {
            program,
            user_agent,
        }
    }

    fn base_args<'a>(&'a self, args: &mut Vec<&'a str>, cookies: Option<&'a Path>) {
        args.push("--no-warnings");
        if let Some(user_agent) = &self.user_agent {
            args.extend(["--user-agent", user_agent.as_str()]);
        }
        if let Some(cookies) = cookies.and_then(Path::to_str) {
            args.extend(["--cookies", cookies]);
        }
    }

    async fn fetch_metadata(
        &self,
        source: &SourceDescriptor,
        cookies: Option<&Path>,
    ) -> Result<MediaMetadata, PipelineError> {
        let mut args = vec!["-J", "--no-playlist"];
        self.base_args(&mut args, cookies);

        let res = run_command(
            self.program,
            |cmd| cmd.args(&args).arg("--").arg(source.url()),
            Capture::STDOUT | Capture::STDERR,
        )
        .await
        .map_err(|e| {
            PipelineError::SourceUnavailable(format!("Failed to run {}: {}", self.program, e))
        })?;

        if !res.status.success() {
            return Err(classify_failure(&String::from_utf8_lossy(&res.stderr)));
        }

        parse_metadata(&res.stdout, cookies.is_some())
    }
}

#[async_trait]
impl SourceResolver for YtDlpResolver {
    async fn resolve(&self, source: &SourceDescriptor) -> Result<MediaMetadata, PipelineError> {
        match self.fetch_metadata(source, None).await {
            Err(PipelineError::AuthRequired(reason)) => match source.cookies() {
                Some(cookies) => {
                    info!(video_id = source.id(), "Retrying resolve with cookies: {}", reason);
                    self.fetch_metadata(source, Some(cookies)).await
                }
                None => Err(PipelineError::AuthRequired(reason)),
            },
            other => other,
        }
    }

    async fn open_stream(
        &self,
        source: &SourceDescriptor,
        option: &EncodingOption,
    ) -> Result<ByteStream, PipelineError> {
        let cookies = if option.requires_auth {
            source.cookies()
        } else {
            None
        };
        let mut args = vec!["-q", "--no-part", "-f", option.token.as_str(), "-o", "-"];
        self.base_args(&mut args, cookies);

        let mut cmd = process::command(self.program);
        cmd.args(&args)
            .arg("--")
            .arg(source.url())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        debug!("Spawning stream command: {cmd:?}");

        let mut child = cmd.spawn().map_err(|e| {
            PipelineError::SourceUnavailable(format!("Failed to run {}: {}", self.program, e))
        })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            PipelineError::SourceUnavailable("stream process has no stdout".to_string())
        })?;
        let mut stderr = child.stderr.take().ok_or_else(|| {
            PipelineError::SourceUnavailable("stream process has no stderr".to_string())
        })?;

        // Drained concurrently so a chatty child never blocks on a full pipe
        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = stderr.read_to_end(&mut buf).await;
            buf
        });

        // Resolves once stdout is exhausted; the child stays owned by the
        // stream so dropping the stream kills it
        let exit = futures::stream::once(async move {
            let status = child.wait().await;
            let stderr = stderr_task.await.unwrap_or_default();
            match status {
                Ok(status) if status.success() => None,
                Ok(status) => {
                    debug!("stream process exited with {}", status);
                    Some(classify_failure(&String::from_utf8_lossy(&stderr)))
                }
                Err(e) => Some(PipelineError::SourceUnavailable(e.to_string())),
            }
        })
        .filter_map(futures::future::ready)
        .map(|err| Err::<bytes::Bytes, _>(err.into_io()));

        Ok(ReaderStream::new(stdout).chain(exit).boxed())
    }
}

#[derive(Debug, Deserialize)]
struct RawInfo {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    uploader: Option<String>,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    formats: Vec<RawFormat>,
}

#[derive(Debug, Deserialize)]
struct RawFormat {
    format_id: String,
    #[serde(default)]
    ext: Option<String>,
    #[serde(default)]
    vcodec: Option<String>,
    #[serde(default)]
    acodec: Option<String>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    abr: Option<f64>,
    #[serde(default)]
    tbr: Option<f64>,
}

impl RawFormat {
    fn into_option(self, requires_auth: bool) -> Option<EncodingOption> {
        let codec = |value: Option<String>| value.filter(|c| c != "none");
        let has_video = match self.vcodec.as_deref() {
            Some(vcodec) => vcodec != "none",
            None => self.height.is_some(),
        };
        let has_audio = matches!(self.acodec.as_deref(), Some(acodec) if acodec != "none");

        let mut capabilities = Capabilities::empty();
        capabilities.set(Capabilities::VIDEO, has_video);
        capabilities.set(Capabilities::AUDIO, has_audio);
        if capabilities.is_empty() {
            return None;
        }

        Some(EncodingOption {
            token: self.format_id,
            container: self.ext.unwrap_or_default(),
            video_codec: codec(self.vcodec),
            audio_codec: codec(self.acodec),
            height: if has_video { self.height } else { None },
            audio_bitrate_kbps: self.abr,
            total_bitrate_kbps: self.tbr,
            capabilities,
            requires_auth,
        })
    }
}

/// Parse the output of `yt-dlp -J`, dropping formats without media streams
fn parse_metadata(json: &[u8], requires_auth: bool) -> Result<MediaMetadata, PipelineError> {
    let raw: RawInfo = serde_json::from_slice(json).map_err(|e| {
        PipelineError::SourceUnavailable(format!("Could not parse resolver output: {}", e))
    })?;

    Ok(MediaMetadata {
        title: raw.title.unwrap_or_else(|| "video".to_string()),
        duration: raw.duration.unwrap_or(0.0),
        thumbnail: raw.thumbnail,
        author: raw.uploader.or(raw.channel).unwrap_or_default(),
        formats: raw
            .formats
            .into_iter()
            .filter_map(|format| format.into_option(requires_auth))
            .collect(),
    })
}

const AUTH_MARKERS: [&str; 7] = [
    "sign in",
    "login",
    "log in",
    "cookies",
    "age-restricted",
    "members-only",
    "private video",
];

const TRANSIENT_MARKERS: [&str; 5] = [
    "http error 5",
    "service unavailable",
    "timed out",
    "temporary failure",
    "connection reset",
];

const NOT_FOUND_MARKERS: [&str; 7] = [
    "video unavailable",
    "video is not available",
    "http error 404",
    "unsupported url",
    "incomplete youtube id",
    "does not exist",
    "has been removed",
];

/// Map resolver stderr to a pipeline error.
///
/// Auth markers are checked before anything else; outages never map to
/// `SourceNotFound`.
fn classify_failure(stderr: &str) -> PipelineError {
    let errors: Vec<&str> = stderr
        .lines()
        .filter_map(|line| line.trim().strip_prefix("ERROR:"))
        .map(str::trim)
        .collect();

    let message = if errors.is_empty() {
        process::stderr_tail(stderr.as_bytes(), 1)
    } else {
        errors.join("; ")
    };
    let lowered = message.to_lowercase();
    let matches = |markers: &[&str]| markers.iter().any(|m| lowered.contains(m));

    if message.is_empty() {
        PipelineError::SourceUnavailable("resolver exited without a message".to_string())
    } else if matches(&AUTH_MARKERS) {
        PipelineError::AuthRequired(message)
    } else if matches(&TRANSIENT_MARKERS) {
        PipelineError::SourceUnavailable(message)
    } else if matches(&NOT_FOUND_MARKERS) {
        PipelineError::SourceNotFound(message)
    } else {
        PipelineError::SourceUnavailable(message)
    }
}
