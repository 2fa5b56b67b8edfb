//! Command-line argument definitions

use std::path::PathBuf;

use clap::Args;

/// Arguments for the serve command
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Listen address, e.g. 127.0.0.1:3001
    #[arg(long)]
    pub listen: Option<String>,

    /// Directory receiving finished artifacts
    #[arg(long)]
    pub downloads_dir: Option<PathBuf>,
}

/// Arguments for the trim command
#[derive(Args, Debug)]
pub struct TrimArgs {
    /// Video id or watch URL
    #[arg(short, long)]
    pub video_id: String,

    /// Start time (HH:MM:SS.ms, MM:SS.ms, or seconds)
    #[arg(short, long)]
    pub start: String,

    /// End time (HH:MM:SS.ms, MM:SS.ms, or seconds)
    #[arg(short, long)]
    pub end: String,

    /// Quality tier: 360p, 480p, 720p, 1080p or highest
    #[arg(short, long, default_value = "highest")]
    pub quality: String,

    /// Output container: mp4, webm, mkv, mov, mp3 or m4a
    #[arg(short, long, default_value = "mp4")]
    pub format: String,

    /// Keep the audio only (always mp3)
    #[arg(long)]
    pub audio_only: bool,

    /// Write the artifact here instead of the downloads directory
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}

/// Arguments for the info command
#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Video id or watch URL
    #[arg(short, long)]
    pub video_id: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}
