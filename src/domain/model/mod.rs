// Domain models - Core types and data structures

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use bitflags::bitflags;
use regex::Regex;
use serde::Serialize;

use crate::domain::errors::PipelineError;

/// Time specification with precision - represents time in seconds with fractional precision
#[derive(Debug, Clone, PartialEq, PartialOrd)]
pub struct TimeSpec {
    pub seconds: f64,
}

impl TimeSpec {
    /// Create a new TimeSpec from seconds
    pub fn from_seconds(seconds: f64) -> Self {
        Self { seconds }
    }

    /// Create a new TimeSpec from hours, minutes, seconds, milliseconds
    pub fn from_components(hours: u32, minutes: u32, seconds: u32, milliseconds: u32) -> Self {
        let total_seconds = hours as f64 * 3600.0
            + minutes as f64 * 60.0
            + seconds as f64
            + milliseconds as f64 / 1000.0;
        Self {
            seconds: total_seconds,
        }
    }

    /// Parse time string: seconds (`12.5`), `MM:SS(.ms)` or `HH:MM:SS(.ms)`
    pub fn parse(time_str: &str) -> Result<Self, PipelineError> {
        let trimmed = time_str.trim();

        if let Ok(seconds) = trimmed.parse::<f64>() {
            if !seconds.is_finite() || seconds < 0.0 {
                return Err(PipelineError::Validation(format!(
                    "Time must be a non-negative number: {}",
                    time_str
                )));
            }
            return Ok(Self::from_seconds(seconds));
        }

        let parts: Vec<&str> = trimmed.split(':').collect();
        let invalid = |what: &str| PipelineError::Validation(format!("Invalid {}: {}", what, time_str));
        match parts.as_slice() {
            [minutes, seconds] => {
                let minutes = minutes.parse::<u32>().map_err(|_| invalid("minutes"))?;
                let seconds = seconds.parse::<f64>().map_err(|_| invalid("seconds"))?;
                if !(0.0..60.0).contains(&seconds) {
                    return Err(invalid("seconds"));
                }
                Ok(Self::from_seconds(minutes as f64 * 60.0 + seconds))
            }
            [hours, minutes, seconds] => {
                let hours = hours.parse::<u32>().map_err(|_| invalid("hours"))?;
                let minutes = minutes.parse::<u32>().map_err(|_| invalid("minutes"))?;
                let seconds = seconds.parse::<f64>().map_err(|_| invalid("seconds"))?;
                if minutes >= 60 {
                    return Err(invalid("minutes"));
                }
                if !(0.0..60.0).contains(&seconds) {
                    return Err(invalid("seconds"));
                }
                Ok(Self::from_seconds(
                    hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds,
                ))
            }
            _ => Err(PipelineError::Validation(format!(
                "Invalid time format: {}. Supported formats: seconds (e.g., 123.45), MM:SS.ms (e.g., 2:30.5), HH:MM:SS.ms (e.g., 1:02:30.5)",
                time_str
            ))),
        }
    }

    /// Format as HH:MM:SS.ms (hours omitted when zero)
    pub fn format_hms(&self) -> String {
        let total_ms = (self.seconds * 1000.0).round() as u64;
        let hours = total_ms / 3_600_000;
        let minutes = (total_ms % 3_600_000) / 60_000;
        let seconds = (total_ms % 60_000) / 1000;
        let milliseconds = total_ms % 1000;

        if hours > 0 {
            format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, milliseconds)
        } else {
            format!("{:02}:{:02}.{:03}", minutes, seconds, milliseconds)
        }
    }
}

impl fmt::Display for TimeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_hms())
    }
}

/// Requested `[start, end)` window in seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimWindow {
    pub start: f64,
    pub end: f64,
}

impl TrimWindow {
    /// Create a window, rejecting negative, non-finite or empty ranges
    pub fn new(start: f64, end: f64) -> Result<Self, PipelineError> {
        if !start.is_finite() || !end.is_finite() {
            return Err(PipelineError::Validation(
                "startTime and endTime must be finite numbers".to_string(),
            ));
        }
        if start < 0.0 || end < 0.0 {
            return Err(PipelineError::Validation(
                "startTime and endTime cannot be negative".to_string(),
            ));
        }
        if start >= end {
            return Err(PipelineError::Validation(format!(
                "startTime ({}) must be less than endTime ({})",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Check the window against a known media duration
    pub fn validate_against_duration(&self, media_duration: f64) -> Result<(), PipelineError> {
        if media_duration > 0.0 && self.end > media_duration {
            return Err(PipelineError::Validation(format!(
                "endTime ({}) exceeds video duration ({})",
                self.end, media_duration
            )));
        }
        Ok(())
    }
}

/// Categorical quality tier, ranked highest > 1080p > 720p > 480p > 360p
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QualityTier {
    P360,
    P480,
    P720,
    P1080,
    Highest,
    HighestAudio,
}

impl QualityTier {
    /// Strict parse, used for configuration keys
    pub fn parse(value: &str) -> Result<Self, PipelineError> {
        match value.trim().to_lowercase().as_str() {
            "highest" | "highestvideo" => Ok(QualityTier::Highest),
            "1080p" | "1080" => Ok(QualityTier::P1080),
            "720p" | "720" => Ok(QualityTier::P720),
            "480p" | "480" => Ok(QualityTier::P480),
            "360p" | "360" => Ok(QualityTier::P360),
            "highestaudio" | "highest audio" => Ok(QualityTier::HighestAudio),
            other => Err(PipelineError::Validation(format!(
                "Invalid quality: {}. Valid qualities: highest, 1080p, 720p, 480p, 360p",
                other
            ))),
        }
    }

    /// Lenient parse for requests: unknown values mean the highest video
    pub fn parse_or_highest(value: Option<&str>) -> Self {
        value
            .and_then(|v| Self::parse(v).ok())
            .unwrap_or(QualityTier::Highest)
    }

    /// Tier of a video stream with the given height
    pub fn from_height(height: u32) -> Self {
        match height {
            h if h > 1080 => QualityTier::Highest,
            h if h >= 1080 => QualityTier::P1080,
            h if h >= 720 => QualityTier::P720,
            h if h >= 480 => QualityTier::P480,
            _ => QualityTier::P360,
        }
    }

    /// Rank among video tiers; audio ranks below every video tier
    pub fn rank(&self) -> u8 {
        match self {
            QualityTier::Highest => 5,
            QualityTier::P1080 => 4,
            QualityTier::P720 => 3,
            QualityTier::P480 => 2,
            QualityTier::P360 => 1,
            QualityTier::HighestAudio => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityTier::Highest => "highest",
            QualityTier::P1080 => "1080p",
            QualityTier::P720 => "720p",
            QualityTier::P480 => "480p",
            QualityTier::P360 => "360p",
            QualityTier::HighestAudio => "highestaudio",
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

bitflags! {
    /// Streams carried by an encoding
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Capabilities: u8 {
        const VIDEO = 0b01;
        const AUDIO = 0b10;
    }
}

/// One fetchable stream variant of a video
#[derive(Debug, Clone, PartialEq)]
pub struct EncodingOption {
    /// Opaque token handed back to the resolver to fetch this exact stream
    pub token: String,
    /// Container/extension tag reported by the provider
    pub container: String,
    pub video_codec: Option<String>,
    pub audio_codec: Option<String>,
    pub height: Option<u32>,
    pub audio_bitrate_kbps: Option<f64>,
    pub total_bitrate_kbps: Option<f64>,
    pub capabilities: Capabilities,
    /// Listed only with credentials, so fetching it needs them too
    pub requires_auth: bool,
}

impl EncodingOption {
    pub fn has_video(&self) -> bool {
        self.capabilities.contains(Capabilities::VIDEO)
    }

    pub fn has_audio(&self) -> bool {
        self.capabilities.contains(Capabilities::AUDIO)
    }

    pub fn is_combined(&self) -> bool {
        self.capabilities
            .contains(Capabilities::VIDEO | Capabilities::AUDIO)
    }

    pub fn tier(&self) -> QualityTier {
        if !self.has_video() {
            return QualityTier::HighestAudio;
        }
        QualityTier::from_height(self.height.unwrap_or(0))
    }
}

/// Metadata of a resolved video
#[derive(Debug, Clone, PartialEq)]
pub struct MediaMetadata {
    pub title: String,
    /// Total duration in seconds, 0 when unknown
    pub duration: f64,
    pub thumbnail: Option<String>,
    pub author: String,
    pub formats: Vec<EncodingOption>,
}

fn video_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{1,64}$").expect("valid video id regex"))
}

fn video_url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^(?:https?://)?(?:www\.|m\.|music\.)?(?:youtube\.com/(?:watch\?(?:.*&)?v=|shorts/|embed/|live/)|youtu\.be/)([A-Za-z0-9_-]{1,64})",
        )
        .expect("valid video url regex")
    })
}

/// Check a bare video identifier
pub fn is_valid_video_id(id: &str) -> bool {
    video_id_pattern().is_match(id)
}

/// Identifies a remote video
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDescriptor {
    id: String,
    url: String,
    cookies: Option<PathBuf>,
}

impl SourceDescriptor {
    /// Build a descriptor from a bare id or a watch URL.
    ///
    /// `url_template` must contain `{id}`; `cookies` is only kept when the file exists.
    pub fn parse(
        input: &str,
        url_template: &str,
        cookies: Option<&Path>,
    ) -> Result<Self, PipelineError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(PipelineError::SourceNotFound(
                "Video ID is required".to_string(),
            ));
        }

        let id = if is_valid_video_id(input) {
            input.to_string()
        } else if let Some(captures) = video_url_pattern().captures(input) {
            captures[1].to_string()
        } else {
            return Err(PipelineError::SourceNotFound(format!(
                "Unrecognized video identifier: {}",
                input
            )));
        };

        Ok(Self {
            url: url_template.replace("{id}", &id),
            id,
            cookies: cookies.filter(|path| path.is_file()).map(Path::to_path_buf),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn cookies(&self) -> Option<&Path> {
        self.cookies.as_deref()
    }
}

/// Output container supported by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Container {
    Mp4,
    Webm,
    Mkv,
    Mov,
    Mp3,
    M4a,
}

impl Container {
    pub fn parse(value: &str) -> Result<Self, PipelineError> {
        match value.trim().to_lowercase().as_str() {
            "mp4" => Ok(Container::Mp4),
            "webm" => Ok(Container::Webm),
            "mkv" | "matroska" => Ok(Container::Mkv),
            "mov" => Ok(Container::Mov),
            "mp3" => Ok(Container::Mp3),
            "m4a" => Ok(Container::M4a),
            other => Err(PipelineError::UnsupportedContainer(format!(
                "{} (supported: mp4, webm, mkv, mov, mp3, m4a)",
                other
            ))),
        }
    }

    /// File extension of artifacts in this container
    pub fn extension(&self) -> &'static str {
        match self {
            Container::Mp4 => "mp4",
            Container::Webm => "webm",
            Container::Mkv => "mkv",
            Container::Mov => "mov",
            Container::Mp3 => "mp3",
            Container::M4a => "m4a",
        }
    }

    /// Muxer name understood by ffmpeg's `-f`
    pub fn muxer(&self) -> &'static str {
        match self {
            Container::Mp4 => "mp4",
            Container::Webm => "webm",
            Container::Mkv => "matroska",
            Container::Mov => "mov",
            Container::Mp3 => "mp3",
            Container::M4a => "ipod",
        }
    }

    pub fn is_audio_only(&self) -> bool {
        matches!(self, Container::Mp3 | Container::M4a)
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A validated trim request
#[derive(Debug, Clone, PartialEq)]
pub struct TrimRequest {
    pub video_id: String,
    pub window: TrimWindow,
    pub quality: QualityTier,
    pub format: String,
    pub audio_only: bool,
    pub destination: Option<PathBuf>,
}

impl TrimRequest {
    /// Create a request; rejects empty ids and invalid windows
    pub fn new(video_id: &str, start: f64, end: f64) -> Result<Self, PipelineError> {
        if video_id.trim().is_empty() {
            return Err(PipelineError::Validation("videoId is required".to_string()));
        }

        Ok(Self {
            video_id: video_id.trim().to_string(),
            window: TrimWindow::new(start, end)?,
            quality: QualityTier::Highest,
            format: "mp4".to_string(),
            audio_only: false,
            destination: None,
        })
    }

    pub fn with_quality(mut self, quality: QualityTier) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    pub fn with_audio_only(mut self, audio_only: bool) -> Self {
        self.audio_only = audio_only;
        self
    }

    pub fn with_destination(mut self, destination: Option<PathBuf>) -> Self {
        self.destination = destination;
        self
    }

    /// Container of the artifact: audio-only requests always produce mp3
    pub fn output_container(&self) -> Result<Container, PipelineError> {
        if self.audio_only {
            return Ok(Container::Mp3);
        }
        Container::parse(&self.format)
    }
}

/// State of a pipeline job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Created,
    Resolving,
    Downloading,
    Extracting,
    Completed,
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobState::Created => "created",
            JobState::Resolving => "resolving",
            JobState::Downloading => "downloading",
            JobState::Extracting => "extracting",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Outcome of a successful job, returned to the request surface
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrimResult {
    pub success: bool,
    pub file_name: String,
    pub download_url: String,
    pub message: String,
    pub file_type: String,
    #[serde(skip)]
    pub output_path: PathBuf,
}

impl TrimResult {
    pub fn success(output_path: PathBuf, container: Container, audio_only: bool) -> Self {
        let file_name = output_path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        let message = if audio_only {
            "Audio extracted successfully"
        } else {
            "Video segment processed successfully"
        };

        Self {
            success: true,
            download_url: format!("/downloads/{}", file_name),
            file_name,
            message: message.to_string(),
            file_type: container.extension().to_string(),
            output_path,
        }
    }
}

/// Explicit configuration handed to the orchestrator at construction
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub downloads_dir: PathBuf,
    pub watch_url_template: String,
    pub cookies_file: Option<PathBuf>,
    pub resolve_timeout: Duration,
    pub download_timeout: Duration,
    pub audio_bitrate_kbps: u32,
    pub quality_map: HashMap<QualityTier, Vec<String>>,
    pub max_concurrent_jobs: usize,
    pub verify_output: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            downloads_dir: PathBuf::from("downloads"),
            watch_url_template: "https://www.youtube.com/watch?v={id}".to_string(),
            cookies_file: None,
            resolve_timeout: Duration::from_secs(30),
            download_timeout: Duration::from_secs(900),
            audio_bitrate_kbps: 192,
            quality_map: HashMap::new(),
            max_concurrent_jobs: 0,
            verify_output: true,
        }
    }
}

impl PipelineSettings {
    pub fn descriptor(&self, input: &str) -> Result<SourceDescriptor, PipelineError> {
        SourceDescriptor::parse(input, &self.watch_url_template, self.cookies_file.as_deref())
    }
}
