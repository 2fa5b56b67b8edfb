// Tracing log adapter - Structured logging using tracing crate

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Levels accepted by `--log-level` and `[log] level`
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Whether `level` names a known log level
pub fn is_valid_level(level: &str) -> bool {
    LOG_LEVELS.contains(&level.to_lowercase().as_str())
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `level` when set. Calling this twice is a no-op.
pub fn init_logging(level: &str, json: bool) -> Result<()> {
    if !is_valid_level(level) {
        return Err(anyhow!(
            "Invalid log level: {}. Valid levels: {}",
            level,
            LOG_LEVELS.join(", ")
        ));
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_lowercase()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    // Already initialized (tests, repeated calls) is not an error
    let _ = if json {
        builder.json().with_current_span(true).try_init()
    } else {
        builder.compact().with_line_number(true).try_init()
    };

    Ok(())
}
