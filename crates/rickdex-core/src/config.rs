use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use crate::aggregator::{AggregatorConfig, DEFAULT_BOUNDED_LIMIT, DEFAULT_BOUNDED_PAGES};

pub const DEFAULT_API_URL: &str = "https://rickandmortyapi.com/api/character";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserConfig {
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetConfig {
    #[serde(default = "default_bounded_pages")]
    pub bounded_pages: u32,
    #[serde(default = "default_bounded_limit")]
    pub bounded_limit: usize,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            bounded_pages: default_bounded_pages(),
            bounded_limit: default_bounded_limit(),
        }
    }
}

impl From<&DatasetConfig> for AggregatorConfig {
    fn from(config: &DatasetConfig) -> Self {
        Self {
            bounded_pages: config.bounded_pages,
            bounded_limit: config.bounded_limit,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite file backing favorites and the session. Defaults under the
    /// platform data dir.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Configuration after environment overrides and output resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveConfig {
    pub browser: BrowserConfig,
    pub store_path: PathBuf,
    pub resolved_output: String,
}

pub fn load_browser_config() -> Result<BrowserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(BrowserConfig::default());
    };
    load_browser_config_from(&config_dir.join("rickdex/config.toml"))
}

pub fn load_browser_config_from(path: &Path) -> Result<BrowserConfig> {
    if !path.exists() {
        return Ok(BrowserConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<BrowserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn resolve_config(cli_json: bool) -> Result<EffectiveConfig> {
    let mut browser = load_browser_config()?;
    if let Ok(url) = env::var("RICKDEX_API_URL") {
        if !url.trim().is_empty() {
            browser.api.base_url = url;
        }
    }

    let data_dir = env::var_os("RICKDEX_DATA_DIR").map(PathBuf::from);
    let store_path = resolve_store_path(&browser.storage, data_dir)?;

    let env_format = env::var("FORMAT").ok();
    let resolved_output = resolve_output(cli_json, browser.output.clone(), env_format);

    Ok(EffectiveConfig {
        browser,
        store_path,
        resolved_output,
    })
}

/// `RICKDEX_DATA_DIR` wins over the configured path, which wins over the
/// platform data dir.
fn resolve_store_path(storage: &StorageConfig, data_dir: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = data_dir {
        return Ok(dir.join("store.sqlite3"));
    }
    if let Some(path) = &storage.path {
        return Ok(path.clone());
    }
    dirs::data_dir()
        .map(|dir| dir.join("rickdex/store.sqlite3"))
        .context("No data directory available; set RICKDEX_DATA_DIR")
}

fn resolve_output(
    cli_json: bool,
    config_output: Option<String>,
    env_format: Option<String>,
) -> String {
    fn normalize_output_mode(raw: &str) -> Option<&'static str> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" | "human" => Some("pretty"),
            "text" | "table" => Some("text"),
            "json" => Some("json"),
            _ => None,
        }
    }

    if cli_json {
        return "json".to_string();
    }

    if let Some(mode) = env_format.as_deref().and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if let Some(mode) = config_output.as_deref().and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if std::io::stdout().is_terminal() {
        "pretty".to_string()
    } else {
        "text".to_string()
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

const fn default_timeout_secs() -> u64 {
    15
}

const fn default_bounded_pages() -> u32 {
    DEFAULT_BOUNDED_PAGES
}

const fn default_bounded_limit() -> usize {
    DEFAULT_BOUNDED_LIMIT
}
