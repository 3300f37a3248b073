//! Configuration resolution
//!
//! Resolves the scoring service base URL with CLI-arg → environment → TOML
//! config file → compiled default priority.

use serde::Deserialize;
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Default scoring service address
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:6969";

/// Environment variable overriding the base URL
pub const API_URL_ENV_VAR: &str = "FEDHEALTH_API_URL";

/// TOML config file contents (`~/.config/fedhealth/client.toml`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub api_base_url: Option<String>,
}

/// Resolved client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base_url: String,
}

impl ClientConfig {
    /// Resolve the base URL following the priority order:
    /// 1. Command-line argument
    /// 2. `FEDHEALTH_API_URL` environment variable
    /// 3. TOML config file
    /// 4. Compiled default
    pub fn resolve(cli_arg: Option<&str>) -> Self {
        if let Some(url) = cli_arg {
            return Self::with_base_url(url);
        }

        if let Ok(url) = std::env::var(API_URL_ENV_VAR) {
            if !url.trim().is_empty() {
                tracing::info!("API base URL loaded from environment variable");
                return Self::with_base_url(&url);
            }
        }

        if let Some(url) = load_toml_config().and_then(|c| c.api_base_url) {
            tracing::info!("API base URL loaded from TOML config");
            return Self::with_base_url(&url);
        }

        Self::with_base_url(DEFAULT_API_BASE_URL)
    }

    /// Normalize a base URL (endpoint paths start with `/`)
    pub fn with_base_url(url: &str) -> Self {
        Self {
            api_base_url: url.trim().trim_end_matches('/').to_string(),
        }
    }
}

fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("fedhealth").join("client.toml"))
}

fn load_toml_config() -> Option<TomlConfig> {
    let path = config_file_path()?;
    if !path.exists() {
        return None;
    }

    match read_toml_config(&path) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable config file");
            None
        }
    }
}

fn read_toml_config(path: &PathBuf) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
    toml::from_str(&content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
}
