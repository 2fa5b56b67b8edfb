//! CLI module for InkCut
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod args;
pub mod commands;

pub use args::{InfoArgs, ServeArgs, TrimArgs};

/// InkCut segment service
///
/// Trims a window out of an online video and hands it back as a local media
/// file, either over HTTP (`serve`) or directly from the command line.
#[derive(Parser, Debug)]
#[command(name = "inkcut")]
#[command(about = "InkCut - Trim segments out of online videos")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true, env = "INKCUT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Logging level
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server
    Serve(ServeArgs),
    /// Trim a segment and write it to the downloads directory
    Trim(TrimArgs),
    /// Show title, duration and author of a video
    Info(InfoArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_trim() {
        let cli = Cli::try_parse_from([
            "inkcut", "--log-level", "debug", "trim", "--video-id", "abc123", "--start", "0:10",
            "--end", "40", "--quality", "720p", "--audio-only",
        ])
        .unwrap();

        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        match cli.command {
            Commands::Trim(args) => {
                assert_eq!(args.video_id, "abc123");
                assert_eq!(args.start, "0:10");
                assert_eq!(args.quality, "720p");
                assert_eq!(args.format, "mp4");
                assert!(args.audio_only);
                assert!(args.output_dir.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_serve_defaults() {
        let cli = Cli::try_parse_from(["inkcut", "serve"]).unwrap();
        match cli.command {
            Commands::Serve(args) => {
                assert!(args.listen.is_none());
                assert!(args.downloads_dir.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
