//! Configuration file management.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use garden_core::{DEFAULT_BASE_URL, NoToken, StaticToken, SyncOptions, TokenFile, TokenProvider};

/// Configuration file structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Backend base URL
    #[serde(default)]
    pub base_url: Option<String>,

    /// Bearer token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// File holding the bearer token, re-read for every request
    #[serde(default)]
    pub token_file: Option<PathBuf>,

    /// Default device id
    #[serde(default)]
    pub device: Option<String>,

    /// Cooldown after a toggle in milliseconds
    #[serde(default)]
    pub cooldown_ms: Option<u64>,

    /// Device aliases (friendly name -> device id)
    #[serde(default)]
    pub aliases: HashMap<String, String>,
}

impl Config {
    /// Get the config file path
    pub fn path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("garden")
            .join("config.toml")
    }

    /// Load config from `path`, or return default if missing or invalid
    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        eprintln!("Warning: Failed to parse config: {}", e);
                    }
                },
                Err(e) => {
                    eprintln!("Warning: Failed to read config: {}", e);
                }
            }
        }
        Self::default()
    }

    /// Save config to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Synchronizer options derived from the config
    pub fn sync_options(&self) -> SyncOptions {
        match self.cooldown_ms {
            Some(ms) => SyncOptions::default().cooldown(Duration::from_millis(ms)),
            None => SyncOptions::default(),
        }
    }
}

/// Resolve device from arg (or env var, via clap) or config.
/// Aliases are resolved in both cases.
pub fn resolve_device(device: Option<String>, config: &Config) -> Option<String> {
    device
        .or_else(|| config.device.clone())
        .map(|d| resolve_alias(&d, config))
}

/// Resolve an alias to its device id, or return the original if not an alias.
pub fn resolve_alias(device: &str, config: &Config) -> String {
    config
        .aliases
        .get(device)
        .cloned()
        .unwrap_or_else(|| device.to_string())
}

/// Resolve the backend URL: flag or env var first, then config, then default.
pub fn resolve_base_url(url: Option<&str>, config: &Config) -> String {
    url.map(String::from)
        .or_else(|| config.base_url.clone())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
}

/// Pick the token source: explicit token, then config token, then token file.
pub fn token_provider(token: Option<String>, config: &Config) -> Arc<dyn TokenProvider> {
    if let Some(token) = token.or_else(|| config.token.clone()) {
        return Arc::new(StaticToken::new(token));
    }
    match &config.token_file {
        Some(path) => Arc::new(TokenFile::new(path)),
        None => Arc::new(NoToken),
    }
}
