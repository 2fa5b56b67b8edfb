//! Command implementations

use anyhow::{anyhow, Context, Result};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::adapters::AppConfig;
use crate::app::{AppContainer, DefaultAppContainer, VideoInfo};
use crate::cli::args::{InfoArgs, TrimArgs};
use crate::domain::errors::PipelineError;
use crate::domain::model::{QualityTier, TimeSpec, TrimRequest};
use crate::http::{self, AppState};
use crate::utils::path::PathUtils;
use crate::utils::time::format_clock;
use crate::utils::Utils;

/// Execute the serve command
pub async fn serve(config: &AppConfig) -> Result<()> {
    let downloads_dir = &config.pipeline.downloads_dir;
    PathUtils::ensure_directory(downloads_dir)
        .await
        .with_context(|| format!("Failed to create downloads directory {}", downloads_dir.display()))?;
    match PathUtils::sweep_temp_artifacts(downloads_dir).await {
        Ok(0) => {}
        Ok(removed) => info!("Removed {} stale temp files from {}", removed, downloads_dir.display()),
        Err(e) => warn!("Could not sweep {}: {}", downloads_dir.display(), e),
    }

    let container = DefaultAppContainer::from_config(config).await?;
    let state = AppState::new(
        &container,
        config.server.dist_dir.clone(),
        config.youtube_api_configured(),
    );

    let addr = config.listen_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Downloads directory: {}", PathUtils::absolutize(downloads_dir).display());
    info!(
        "YouTube API: {}",
        if config.youtube_api_configured() {
            "configured"
        } else {
            "not configured"
        }
    );

    http::serve(listener, state, shutdown_signal())
        .await
        .context("HTTP server failed")?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Could not listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

/// Build a trim request from command-line arguments
pub fn trim_request(args: TrimArgs) -> Result<TrimRequest> {
    let start = TimeSpec::parse(&args.start)
        .map_err(|e| anyhow!("Invalid start time '{}': {}", args.start, e))?;
    let end = TimeSpec::parse(&args.end)
        .map_err(|e| anyhow!("Invalid end time '{}': {}", args.end, e))?;
    let quality = QualityTier::parse(&args.quality)
        .map_err(|e| anyhow!("Invalid quality '{}': {}", args.quality, e))?;

    let request = TrimRequest::new(&args.video_id, start.seconds, end.seconds)
        .map_err(|e| anyhow!("Invalid trim request: {}", e))?
        .with_quality(quality)
        .with_format(args.format)
        .with_audio_only(args.audio_only)
        .with_destination(args.output_dir);

    // Fail on an unknown container before touching the network
    request
        .output_container()
        .map_err(|e| anyhow!("Invalid format: {}", e))?;
    Ok(request)
}

/// Execute the trim command
pub async fn trim(config: &AppConfig, args: TrimArgs) -> Result<()> {
    let request = trim_request(args)?;
    info!(
        "Trimming {} from {:.3}s to {:.3}s",
        request.video_id, request.window.start, request.window.end
    );

    let container = DefaultAppContainer::from_config(config).await?;
    let result = container
        .trim_interactor()
        .execute(request)
        .await
        .map_err(with_summary)?;

    let size = tokio::fs::metadata(&result.output_path)
        .await
        .map(|m| m.len())
        .unwrap_or(0);
    info!("{} ({})", result.message, Utils::format_file_size(size));
    println!("{}", result.output_path.display());
    Ok(())
}

/// Execute the info command
pub async fn info(config: &AppConfig, args: InfoArgs) -> Result<()> {
    let container = DefaultAppContainer::from_config(config).await?;
    let info = container
        .info_interactor()
        .execute(&args.video_id)
        .await
        .map_err(with_summary)?;

    if args.json {
        let json = serde_json::to_string_pretty(&info)
            .context("Failed to serialize video info to JSON")?;
        println!("{}", json);
    } else {
        display_video_info(&info);
    }
    Ok(())
}

fn with_summary(err: PipelineError) -> anyhow::Error {
    let summary = err.user_message();
    anyhow::Error::new(err).context(summary)
}

/// Display video information in human-readable format
fn display_video_info(info: &VideoInfo) {
    println!("Title:     {}", info.title);
    println!("Author:    {}", info.author);
    println!("Duration:  {} ({}s)", format_clock(info.duration), info.duration);
    if let Some(thumbnail) = &info.thumbnail {
        println!("Thumbnail: {}", thumbnail);
    }
}
