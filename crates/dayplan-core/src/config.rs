//! Application configuration management.
//!
//! This module handles loading and saving the application configuration:
//! the hosted database URL, the identity service API key, the assistant
//! endpoint and the last used email.
//!
//! Configuration is stored at `~/.config/dayplan/config.json`. Values can be
//! overridden from the environment (or a `.env` file).

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "dayplan";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const ENV_DATABASE_URL: &str = "DAYPLAN_DATABASE_URL";
const ENV_API_KEY: &str = "DAYPLAN_API_KEY";
const ENV_ASSISTANT_ENDPOINT: &str = "DAYPLAN_ASSISTANT_ENDPOINT";
const ENV_ASSISTANT_MODEL: &str = "DAYPLAN_ASSISTANT_MODEL";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    pub database_url: Option<String>,
    pub api_key: Option<String>,
    pub assistant_endpoint: Option<String>,
    pub assistant_model: Option<String>,
    pub last_email: Option<String>,
    /// Overrides the platform cache directory
    pub cache_dir: Option<PathBuf>,
}

impl Config {
    /// Load the config file (if any) and apply environment overrides
    pub fn load() -> Result<Self> {
        // Load .env file if present (silently ignore if not found)
        let _ = dotenvy::dotenv();

        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            debug!(?path, "No config file, using defaults");
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(v) = get(ENV_DATABASE_URL) {
            self.database_url = Some(v);
        }
        if let Some(v) = get(ENV_API_KEY) {
            self.api_key = Some(v);
        }
        if let Some(v) = get(ENV_ASSISTANT_ENDPOINT) {
            self.assistant_endpoint = Some(v);
        }
        if let Some(v) = get(ENV_ASSISTANT_MODEL) {
            self.assistant_model = Some(v);
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.cache_dir {
            return Ok(dir.clone());
        }
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn database_url(&self) -> Result<&str> {
        self.database_url
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("database_url is not configured (set {})", ENV_DATABASE_URL))
    }

    pub fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("api_key is not configured (set {})", ENV_API_KEY))
    }
}
