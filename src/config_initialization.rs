//! Configuration initialization and hierarchy management

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::adapters::AppConfig;
use crate::cli::{Cli, Commands};

/// Config files looked up when none is given explicitly
const CONFIG_SEARCH_PATHS: [&str; 2] = ["inkcut.toml", "config/inkcut.toml"];

/// Initialize configuration hierarchy following precedence: CLI > Env > File > Defaults
pub fn initialize_configuration_hierarchy(cli: &Cli) -> Result<AppConfig> {
    // A missing .env is the normal case
    if let Ok(path) = dotenv::dotenv() {
        debug!("Loaded environment from {}", path.display());
    }

    let mut config = match locate_config_file(cli.config.as_deref()) {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            AppConfig::load(&path)?
        }
        None => AppConfig::default(),
    };

    let env_overrides = config.apply_env(|name| std::env::var(name).ok())?;
    if env_overrides > 0 {
        info!("Applied {} environment variable overrides", env_overrides);
    }

    let cli_overrides = apply_cli_configuration_overrides(&mut config, cli)?;
    if cli_overrides > 0 {
        info!("Applied {} CLI configuration overrides", cli_overrides);
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Explicit `--config`/`INKCUT_CONFIG` wins; otherwise the first existing search path
fn locate_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    CONFIG_SEARCH_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|path| path.is_file())
}

/// Apply CLI argument overrides to configuration
pub fn apply_cli_configuration_overrides(config: &mut AppConfig, cli: &Cli) -> Result<usize> {
    let mut overrides = 0;

    if let Some(level) = &cli.log_level {
        config.log.level = level.clone();
        overrides += 1;
    }
    if cli.log_json {
        config.log.json = true;
        overrides += 1;
    }

    if let Commands::Serve(args) = &cli.command {
        if let Some(listen) = &args.listen {
            config.set_listen(listen)?;
            overrides += 1;
        }
        if let Some(dir) = &args.downloads_dir {
            config.pipeline.downloads_dir = dir.clone();
            overrides += 1;
        }
    }

    Ok(overrides)
}
