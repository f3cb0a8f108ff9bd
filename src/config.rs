//! TOML configuration for the harvester.
//!
//! ```toml
//! [db]
//! path = "./data/harvest.sqlite"
//!
//! [api]
//! base_url = "https://api.playboard.co/v1/search/channel"
//! timeout_secs = 30
//! rate_limit_retries = 0
//!
//! [api.subscribers]
//! from = 50
//! to = 100000000
//!
//! [harvest]
//! keywords = "learn english, learn spanish"
//! delay_min_secs = 6
//! delay_max_secs = 25
//!
//! [seed]
//! dir = "./FilesToWork"
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub harvest: HarvestConfig,
    #[serde(default)]
    pub seed: SeedConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Extra attempts after an HTTP 429. Zero aborts the keyword on the first 429.
    #[serde(default)]
    pub rate_limit_retries: u32,
    #[serde(default = "default_backoff_secs")]
    pub rate_limit_backoff_secs: u64,
    #[serde(default)]
    pub subscribers: SubscriberRange,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            rate_limit_retries: 0,
            rate_limit_backoff_secs: default_backoff_secs(),
            subscribers: SubscriberRange::default(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.playboard.co/v1/search/channel".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_user_agent() -> String {
    concat!("channel-harvester/", env!("CARGO_PKG_VERSION")).to_string()
}
fn default_backoff_secs() -> u64 {
    30
}

/// Subscriber-count filter sent as the request body of every page fetch.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct SubscriberRange {
    pub from: u64,
    pub to: u64,
}

impl Default for SubscriberRange {
    fn default() -> Self {
        Self {
            from: 50,
            to: 100_000_000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HarvestConfig {
    /// Comma-separated keyword list.
    #[serde(default)]
    pub keywords: String,
    #[serde(default = "default_delay_min")]
    pub delay_min_secs: u64,
    #[serde(default = "default_delay_max")]
    pub delay_max_secs: u64,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            keywords: String::new(),
            delay_min_secs: default_delay_min(),
            delay_max_secs: default_delay_max(),
        }
    }
}

fn default_delay_min() -> u64 {
    6
}
fn default_delay_max() -> u64 {
    25
}

#[derive(Debug, Deserialize, Clone)]
pub struct SeedConfig {
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            dir: None,
            include_globs: default_include_globs(),
        }
    }
}

fn default_include_globs() -> Vec<String> {
    vec!["*.json".to_string()]
}

/// Split a comma-separated keyword list, trimming entries and dropping empty ones.
pub fn parse_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    let base_url = config.api.base_url.trim();
    if base_url.is_empty() {
        bail!("api.base_url must not be empty");
    }
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        bail!("api.base_url must be an http(s) URL, got '{}'", base_url);
    }

    if config.api.subscribers.from > config.api.subscribers.to {
        bail!(
            "api.subscribers.from ({}) must be <= api.subscribers.to ({})",
            config.api.subscribers.from,
            config.api.subscribers.to
        );
    }

    if config.harvest.delay_min_secs > config.harvest.delay_max_secs {
        bail!(
            "harvest.delay_min_secs ({}) must be <= harvest.delay_max_secs ({})",
            config.harvest.delay_min_secs,
            config.harvest.delay_max_secs
        );
    }

    if config.api.timeout_secs == 0 {
        bail!("api.timeout_secs must be > 0");
    }

    Ok(())
}
