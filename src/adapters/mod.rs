// Adapters - External system implementations

pub mod exec_ffmpeg;
pub mod probe_ffprobe;
#[cfg(feature = "libav")]
pub mod probe_libav;
pub mod process;
pub mod toml_config;
pub mod tracing_log;
pub mod youtube_api;
pub mod ytdlp;

// Re-export adapters
pub use exec_ffmpeg::FfmpegExtractor;
pub use probe_ffprobe::FfprobeAdapter;
#[cfg(feature = "libav")]
pub use probe_libav::ProbeLibavAdapter;
pub use toml_config::AppConfig;
pub use youtube_api::YouTubeApiSearch;
pub use ytdlp::YtDlpResolver;
