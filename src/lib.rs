//! InkCut segment service library
//!
//! Trims a time window out of an online video: resolve the source with
//! yt-dlp, pick an encoding, stream it to a job-scoped temp file and cut the
//! window with ffmpeg. Exposed over HTTP (axum) and the `inkcut` CLI.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config_initialization;
pub mod domain;
pub mod http;
pub mod ports;
pub mod utils;

// Re-export commonly used types
pub use domain::errors::PipelineError;
pub use domain::model::{PipelineSettings, TrimRequest, TrimResult};
