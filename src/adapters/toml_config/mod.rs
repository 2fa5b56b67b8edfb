// TOML config adapter - Configuration management using TOML files

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::adapters::tracing_log::is_valid_level;
use crate::domain::model::{PipelineSettings, QualityTier};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Whole application configuration, one table per concern
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Preferred provider format tokens per quality tier
    #[serde(default)]
    pub quality_map: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Bundled front-end served as SPA fallback
    #[serde(default = "default_dist_dir")]
    pub dist_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PipelineConfig {
    #[serde(default = "default_downloads_dir")]
    pub downloads_dir: PathBuf,
    #[serde(default = "default_resolve_timeout")]
    pub resolve_timeout_secs: u64,
    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate_kbps: u32,
    /// Unset means one job per CPU, 0 means unbounded
    #[serde(default)]
    pub max_concurrent_jobs: Option<usize>,
    #[serde(default = "default_true")]
    pub verify_output: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProviderConfig {
    #[serde(default = "default_watch_url_template")]
    pub watch_url_template: String,
    /// Netscape-format cookies used when a video needs signing in
    #[serde(default)]
    pub cookies_file: Option<PathBuf>,
    #[serde(default = "default_user_agent")]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub youtube_api_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_dist_dir() -> PathBuf {
    PathBuf::from("dist")
}

fn default_downloads_dir() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_resolve_timeout() -> u64 {
    30
}

fn default_download_timeout() -> u64 {
    900
}

fn default_audio_bitrate() -> u32 {
    192
}

fn default_true() -> bool {
    true
}

fn default_watch_url_template() -> String {
    "https://www.youtube.com/watch?v={id}".to_string()
}

fn default_user_agent() -> Option<String> {
    Some(DEFAULT_USER_AGENT.to_string())
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            dist_dir: default_dist_dir(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            downloads_dir: default_downloads_dir(),
            resolve_timeout_secs: default_resolve_timeout(),
            download_timeout_secs: default_download_timeout(),
            audio_bitrate_kbps: default_audio_bitrate(),
            max_concurrent_jobs: None,
            verify_output: true,
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            watch_url_template: default_watch_url_template(),
            cookies_file: None,
            user_agent: default_user_agent(),
            youtube_api_key: None,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML config")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Override values from environment variables, read through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<usize>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut applied = 0;
        let mut var = |name: &str| {
            let value = lookup(name).filter(|v| !v.trim().is_empty());
            if value.is_some() {
                applied += 1;
            }
            value
        };

        if let Some(port) = var("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("PORT is not a port number: {}", port))?;
        }
        if let Some(host) = var("HOST") {
            self.server.host = host;
        }
        if let Some(dir) = var("DOWNLOADS_DIR") {
            self.pipeline.downloads_dir = PathBuf::from(dir);
        }
        if let Some(dir) = var("DIST_DIR") {
            self.server.dist_dir = PathBuf::from(dir);
        }
        if let Some(key) = var("YOUTUBE_API_KEY") {
            self.provider.youtube_api_key = Some(key);
        }
        if let Some(cookies) = var("INKCUT_COOKIES_FILE") {
            self.provider.cookies_file = Some(PathBuf::from(cookies));
        }
        if let Some(level) = var("INKCUT_LOG_LEVEL") {
            self.log.level = level;
        }
        if let Some(jobs) = var("INKCUT_MAX_CONCURRENT_JOBS") {
            self.pipeline.max_concurrent_jobs = Some(jobs.trim().parse().with_context(|| {
                format!("INKCUT_MAX_CONCURRENT_JOBS is not a number: {}", jobs)
            })?);
        }

        Ok(applied)
    }

    pub fn validate(&self) -> Result<()> {
        if self.pipeline.resolve_timeout_secs == 0 {
            bail!("pipeline.resolve_timeout_secs must be greater than 0");
        }
        if self.pipeline.download_timeout_secs == 0 {
            bail!("pipeline.download_timeout_secs must be greater than 0");
        }
        if self.pipeline.audio_bitrate_kbps == 0 {
            bail!("pipeline.audio_bitrate_kbps must be greater than 0");
        }
        if !self.provider.watch_url_template.contains("{id}") {
            bail!("provider.watch_url_template must contain {{id}}");
        }
        if !is_valid_level(&self.log.level) {
            bail!("Invalid log level: {}", self.log.level);
        }
        self.quality_map()?;
        self.listen_addr()?;
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .with_context(|| {
                format!(
                    "Invalid listen address {}:{}",
                    self.server.host, self.server.port
                )
            })
    }

    /// Set host and port from an `ADDR:PORT` string
    pub fn set_listen(&mut self, listen: &str) -> Result<()> {
        let addr: SocketAddr = listen
            .parse()
            .with_context(|| format!("Invalid listen address: {}", listen))?;
        self.server.host = addr.ip().to_string();
        self.server.port = addr.port();
        Ok(())
    }

    pub fn quality_map(&self) -> Result<HashMap<QualityTier, Vec<String>>> {
        self.quality_map
            .iter()
            .map(|(tier, tokens)| {
                QualityTier::parse(tier)
                    .map(|tier| (tier, tokens.clone()))
                    .map_err(|e| anyhow!("[quality_map] {}", e))
            })
            .collect()
    }

    pub fn youtube_api_configured(&self) -> bool {
        self.provider
            .youtube_api_key
            .as_deref()
            .map(|key| !key.trim().is_empty())
            .unwrap_or(false)
    }

    /// Concurrency bound actually used: unset means the CPU count
    pub fn max_concurrent_jobs(&self) -> usize {
        self.pipeline
            .max_concurrent_jobs
            .unwrap_or_else(num_cpus::get)
    }

    pub fn pipeline_settings(&self) -> Result<PipelineSettings> {
        Ok(PipelineSettings {
            downloads_dir: self.pipeline.downloads_dir.clone(),
            watch_url_template: self.provider.watch_url_template.clone(),
            cookies_file: self.provider.cookies_file.clone(),
            resolve_timeout: Duration::from_secs(self.pipeline.resolve_timeout_secs),
            download_timeout: Duration::from_secs(self.pipeline.download_timeout_secs),
            audio_bitrate_kbps: self.pipeline.audio_bitrate_kbps,
            quality_map: self.quality_map()?,
            max_concurrent_jobs: self.max_concurrent_jobs(),
            verify_output: self.pipeline.verify_output,
        })
    }
}
