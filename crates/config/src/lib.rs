//! Configuration for CineChunks
//!
//! Settings are read from a JSON config file and can be overridden with
//! environment variables, matching what a deployment typically exports:
//! `OPENAI_API_KEY`, `OPENAI_MODEL`, `OPENAI_API_BASE`, `MCP_URL`.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

pub mod paths;

pub use paths::{config_path, data_dir};

/// Errors in configuration handling
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Model backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: None,
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_tokens() -> u32 {
    8192
}

fn default_temperature() -> f32 {
    0.7
}

/// Subtitle tool server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpConfig {
    #[serde(default = "default_mcp_url")]
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            url: default_mcp_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_mcp_url() -> String {
    "http://127.0.0.1:8000/mcp".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub mcp: McpConfig,
}

impl Config {
    /// Load from the default location, then apply environment overrides
    pub async fn load() -> Result<Self> {
        let path = config_path();
        let mut config = Self::load_from(&path).await?;
        config.apply_env();
        Ok(config)
    }

    /// Load from a specific file, falling back to defaults when absent
    pub async fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("no config file at {:?}, using defaults", path);
            return Ok(Config::default());
        }

        debug!("reading config from {:?}", path);
        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save to the default location
    pub async fn save(&self) -> Result<()> {
        let path = config_path();
        self.save_to(&path).await
    }

    /// Save to a specific file
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        debug!("writing config to {:?}", path);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// Overlay environment variables onto file-based settings
    pub fn apply_env(&mut self) {
        if let Some(key) = env_nonempty("OPENAI_API_KEY") {
            self.openai.api_key = key;
        }
        if let Some(model) = env_nonempty("OPENAI_MODEL") {
            self.openai.model = model;
        }
        if let Some(base) = env_nonempty("OPENAI_API_BASE") {
            self.openai.api_base = Some(base);
        }
        if let Some(url) = env_nonempty("MCP_URL") {
            self.mcp.url = url;
        }
    }

    /// Model backend credential, if one is set anywhere
    pub fn api_key(&self) -> Option<String> {
        let key = self.openai.api_key.trim();
        if key.is_empty() {
            None
        } else {
            Some(key.to_string())
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key().is_some()
    }

    pub fn model(&self) -> String {
        self.openai.model.clone()
    }

    pub fn mcp_url(&self) -> String {
        self.mcp.url.clone()
    }
}

fn env_nonempty(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Write a default config file if none exists yet
pub async fn init() -> Result<Config> {
    let config_path = config_path();

    if config_path.exists() {
        info!("config already present at {:?}", config_path);
    } else {
        let config = Config::default();
        config.save().await?;
        info!("default config written to {:?}", config_path);
    }

    Config::load().await
}
