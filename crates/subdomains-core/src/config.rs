//! Application configuration management.
//!
//! Configuration lives at `~/.config/subdomains/config.json`. Every field has
//! a default pointing at the production services, and a handful can be
//! overridden from the environment (a `.env` file is loaded by the binary).

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Application name used for config/cache directory paths
pub const APP_NAME: &str = "subdomains";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const DEFAULT_API_BASE_URL: &str = "https://behzod.pythonanywhere.com/api";
const DEFAULT_LOGIN_URL: &str = "https://accounts.dovuchcha.uz/login";
const DEFAULT_ACCOUNT_CENTER_URL: &str = "https://accounts.dovuchcha.uz";
const DEFAULT_APP_ORIGIN: &str = "http://localhost:5173";
const DEFAULT_DOMAIN_SUFFIX: &str = "dovuchcha.uz";

/// HTTP request timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Access tokens are renewed every 4 minutes; the server issues them for 5.
const DEFAULT_RENEWAL_INTERVAL_SECS: u64 = 240;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// One file per token under the cache directory
    #[default]
    File,
    /// OS keychain
    Keyring,
    /// Nothing survives the process
    Memory,
}

impl StorageBackend {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "file" => Some(StorageBackend::File),
            "keyring" | "keychain" => Some(StorageBackend::Keyring),
            "memory" => Some(StorageBackend::Memory),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub login_url: String,
    pub account_center_url: String,
    /// Address the account service sends the browser back to after login
    pub app_origin: String,
    pub domain_suffix: String,
    pub storage: StorageBackend,
    pub request_timeout_secs: u64,
    pub renewal_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            login_url: DEFAULT_LOGIN_URL.to_string(),
            account_center_url: DEFAULT_ACCOUNT_CENTER_URL.to_string(),
            app_origin: DEFAULT_APP_ORIGIN.to_string(),
            domain_suffix: DEFAULT_DOMAIN_SUFFIX.to_string(),
            storage: StorageBackend::default(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            renewal_interval_secs: DEFAULT_RENEWAL_INTERVAL_SECS,
        }
    }
}

impl Config {
    /// Read the config file, writing the defaults there on first run, then
    /// apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            if let Err(e) = config.save_to(path) {
                warn!(error = %e, path = %path.display(), "Failed to write default config");
            }
            return Ok(config);
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&contents).context("Failed to parse config file")
    }

    fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }

    /// Apply `SUBDOMAINS_*` overrides. `lookup` is the environment in production.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("SUBDOMAINS_API_BASE_URL") {
            self.api_base_url = v;
        }
        if let Some(v) = lookup("SUBDOMAINS_LOGIN_URL") {
            self.login_url = v;
        }
        if let Some(v) = lookup("SUBDOMAINS_APP_ORIGIN") {
            self.app_origin = v;
        }
        if let Some(v) = lookup("SUBDOMAINS_STORAGE") {
            match StorageBackend::parse(&v) {
                Some(backend) => self.storage = backend,
                None => warn!(value = %v, "Ignoring unknown SUBDOMAINS_STORAGE value"),
            }
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn renewal_interval(&self) -> Duration {
        Duration::from_secs(self.renewal_interval_secs.max(1))
    }
}
