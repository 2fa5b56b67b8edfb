// Domain rules - Business logic and policies

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::domain::errors::*;
use crate::domain::model::*;

/// Selection preferences of a request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormatPreferences {
    pub quality: QualityTier,
    pub audio_only: bool,
}

/// Business rules for picking one encoding out of the provider's list
pub struct FormatSelector;

impl FormatSelector {
    /// Pick an encoding for the given preferences.
    ///
    /// `quality_map` lists preferred provider tokens per tier; it is only a
    /// preference and never makes selection fail.
    pub fn select(
        options: &[EncodingOption],
        prefs: FormatPreferences,
        quality_map: &HashMap<QualityTier, Vec<String>>,
    ) -> Result<EncodingOption, PipelineError> {
        if prefs.audio_only {
            Self::select_audio(options)
        } else {
            Self::select_video(options, prefs.quality, quality_map)
        }
    }

    fn select_audio(options: &[EncodingOption]) -> Result<EncodingOption, PipelineError> {
        let audio_only = options.iter().filter(|o| o.has_audio() && !o.has_video());
        if let Some(best) = first_max_by(audio_only, |a, b| {
            cmp_opt(a.audio_bitrate_kbps, b.audio_bitrate_kbps)
        }) {
            return Ok(best.clone());
        }

        // The extractor drops the video stream of a combined option
        let audio_capable = options.iter().filter(|o| o.has_audio());
        first_max_by(audio_capable, |a, b| {
            cmp_opt(a.audio_bitrate_kbps, b.audio_bitrate_kbps)
                .then_with(|| cmp_opt(a.total_bitrate_kbps, b.total_bitrate_kbps))
        })
        .cloned()
        .ok_or_else(|| {
            PipelineError::NoSuitableFormat("no encoding with an audio stream".to_string())
        })
    }

    fn select_video(
        options: &[EncodingOption],
        quality: QualityTier,
        quality_map: &HashMap<QualityTier, Vec<String>>,
    ) -> Result<EncodingOption, PipelineError> {
        let combined: Vec<&EncodingOption> = options.iter().filter(|o| o.is_combined()).collect();
        if combined.is_empty() {
            return Err(PipelineError::NoSuitableFormat(
                "no encoding with both audio and video".to_string(),
            ));
        }

        if let Some(tokens) = quality_map.get(&quality) {
            for token in tokens {
                if let Some(option) = combined.iter().find(|o| &o.token == token) {
                    return Ok((*option).clone());
                }
            }
        }

        if quality != QualityTier::Highest {
            let matching = combined.iter().copied().filter(|o| o.tier() == quality);
            if let Some(best) = first_max_by(matching, Self::cmp_within_tier) {
                return Ok(best.clone());
            }
        }

        // Exact tier unavailable (or highest requested): best combined option
        first_max_by(combined.iter().copied(), |a, b| {
            a.tier()
                .rank()
                .cmp(&b.tier().rank())
                .then_with(|| Self::cmp_within_tier(a, b))
        })
        .cloned()
        .ok_or_else(|| {
            PipelineError::NoSuitableFormat("no encoding with both audio and video".to_string())
        })
    }

    fn cmp_within_tier(a: &EncodingOption, b: &EncodingOption) -> Ordering {
        a.height
            .cmp(&b.height)
            .then_with(|| cmp_opt(a.total_bitrate_kbps, b.total_bitrate_kbps))
    }
}

/// Maximum that keeps the first element among equals
fn first_max_by<'a, I, F>(iter: I, mut compare: F) -> Option<&'a EncodingOption>
where
    I: Iterator<Item = &'a EncodingOption>,
    F: FnMut(&EncodingOption, &EncodingOption) -> Ordering,
{
    iter.fold(None, |best, candidate| match best {
        Some(current) if compare(candidate, current) != Ordering::Greater => Some(current),
        _ => Some(candidate),
    })
}

/// Missing values rank below any present value
fn cmp_opt(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

/// Business rules for artifact names
pub struct OutputNaming;

impl OutputNaming {
    const MAX_TITLE_CHARS: usize = 50;

    /// Strip everything but ASCII word characters, whitespace and `-`,
    /// collapse whitespace into `_`, cap the length
    pub fn sanitize_title(title: &str) -> String {
        static DISALLOWED: OnceLock<Regex> = OnceLock::new();
        static WHITESPACE: OnceLock<Regex> = OnceLock::new();
        let disallowed = DISALLOWED
            .get_or_init(|| Regex::new(r"[^A-Za-z0-9_\s-]").expect("valid title regex"));
        let whitespace = WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("valid space regex"));

        let stripped = disallowed.replace_all(title, "");
        let joined = whitespace.replace_all(&stripped, "_");
        let truncated: String = joined.chars().take(Self::MAX_TITLE_CHARS).collect();

        if truncated.is_empty() {
            "video".to_string()
        } else {
            truncated
        }
    }

    /// `<sanitizedTitle>_<timestamp>.<ext>`
    pub fn file_name(title: &str, timestamp_ms: i64, container: Container) -> String {
        format!(
            "{}_{}.{}",
            Self::sanitize_title(title),
            timestamp_ms,
            container.extension()
        )
    }
}

/// Streams and duration found in a finished artifact
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeReport {
    pub duration_seconds: Option<f64>,
    pub has_video: bool,
    pub has_audio: bool,
}

/// Business rules for artifact verification
pub struct ArtifactValidator;

impl ArtifactValidator {
    /// Seconds an artifact may deviate from the requested window before a warning
    pub const DURATION_TOLERANCE: f64 = 1.0;

    /// Fail when the artifact violates the request; returns warnings otherwise
    pub fn validate(
        report: &ProbeReport,
        window: &TrimWindow,
        audio_only: bool,
    ) -> Result<Vec<String>, PipelineError> {
        if audio_only && report.has_video {
            return Err(PipelineError::TranscodeFailed(
                "audio-only artifact still contains a video stream".to_string(),
            ));
        }
        if !report.has_audio && !report.has_video {
            return Err(PipelineError::TranscodeFailed(
                "artifact contains no media streams".to_string(),
            ));
        }

        let mut warnings = Vec::new();
        if let Some(duration) = report.duration_seconds {
            let difference = (duration - window.duration()).abs();
            if difference > Self::DURATION_TOLERANCE {
                warnings.push(format!(
                    "artifact lasts {:.3}s, requested {:.3}s",
                    duration,
                    window.duration()
                ));
            }
        }
        Ok(warnings)
    }
}
