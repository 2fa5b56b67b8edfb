//! InkCut segment service
//!
//! Trims a window out of an online video and returns it as a local media file.
//!
//! # Usage
//!
//! ```bash
//! inkcut serve --listen 127.0.0.1:3001
//! inkcut trim --video-id dQw4w9WgXcQ --start 0:10 --end 0:40 --quality 720p
//! inkcut info --video-id dQw4w9WgXcQ --json
//! ```

use anyhow::Result;
use clap::Parser;
use tracing::info;

use inkcut::adapters::tracing_log::init_logging;
use inkcut::cli::{commands, Cli, Commands};
use inkcut::config_initialization::initialize_configuration_hierarchy;

/// Main entry point for the InkCut application
#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    let config = initialize_configuration_hierarchy(&cli)?;
    init_logging(&config.log.level, config.log.json)?;
    info!("Starting InkCut {}", env!("CARGO_PKG_VERSION"));

    // Execute the requested command
    match cli.command {
        Commands::Serve(_) => commands::serve(&config).await,
        Commands::Trim(args) => commands::trim(&config, args).await,
        Commands::Info(args) => commands::info(&config, args).await,
    }
}
