//! Client configuration.
//!
//! Resolved from CLI arguments and an optional TOML file; file values
//! override CLI values where present.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/ui/v1";
pub const DEFAULT_WS_URL: &str = "ws://localhost:8000/websocket";
pub const DEFAULT_CREDENTIALS_FILE: &str = "chirper-credentials.json";
const DEFAULT_RECONNECT_DELAY_SECS: u64 = 5;

/// CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub api_url: Option<String>,
    pub ws_url: Option<String>,
    pub credentials_path: Option<PathBuf>,
    pub reconnect_delay_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    pub api_url: Option<String>,
    pub ws_url: Option<String>,
    pub credentials_path: Option<String>,
    pub reconnect_delay_secs: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_url: String,
    pub ws_url: String,
    pub credentials_path: PathBuf,
    pub reconnect_delay: Duration,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file
    /// config. TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let api_url = file
            .api_url
            .or_else(|| cli.api_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let ws_url = file
            .ws_url
            .or_else(|| cli.ws_url.clone())
            .unwrap_or_else(|| DEFAULT_WS_URL.to_string());

        let credentials_path = file
            .credentials_path
            .map(PathBuf::from)
            .or_else(|| cli.credentials_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CREDENTIALS_FILE));

        let reconnect_delay_secs = file
            .reconnect_delay_secs
            .or(cli.reconnect_delay_secs)
            .unwrap_or(DEFAULT_RECONNECT_DELAY_SECS);
        if reconnect_delay_secs == 0 {
            bail!("reconnect_delay_secs must be greater than zero");
        }

        Ok(Self {
            api_url,
            ws_url,
            credentials_path,
            reconnect_delay: Duration::from_secs(reconnect_delay_secs),
        })
    }
}
