//! Application configuration management.
//!
//! Configuration is stored at `~/.config/usertable/config.json` and can be
//! overridden per run through `USERTABLE_*` environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::sync::RollbackPolicy;
use crate::view::DEFAULT_PAGE_SIZE;

/// Application name used for config directory paths
const APP_NAME: &str = "usertable";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// User service root used when none is configured
const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";

/// HTTP request timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

const ENV_API_URL: &str = "USERTABLE_API_URL";
const ENV_API_TOKEN: &str = "USERTABLE_API_TOKEN";
const ENV_PAGE_SIZE: &str = "USERTABLE_PAGE_SIZE";
const ENV_ROLLBACK: &str = "USERTABLE_ROLLBACK_ON_FAILED_SAVE";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub api_token: Option<String>,
    pub page_size: Option<usize>,
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub rollback_policy: RollbackPolicy,
}

impl Config {
    /// Load the config file (if any) and apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Override settings from `lookup`, normally the process environment.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            self.api_base_url = Some(url);
        }
        if let Some(token) = lookup(ENV_API_TOKEN).filter(|v| !v.trim().is_empty()) {
            self.api_token = Some(token);
        }
        if let Some(size) = lookup(ENV_PAGE_SIZE) {
            match size.trim().parse::<usize>() {
                Ok(size) if size > 0 => self.page_size = Some(size),
                _ => warn!(value = %size, "Ignoring invalid {}", ENV_PAGE_SIZE),
            }
        }
        if let Some(flag) = lookup(ENV_ROLLBACK) {
            match flag.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" => self.rollback_policy = RollbackPolicy::RestoreSnapshot,
                "0" | "false" | "no" => self.rollback_policy = RollbackPolicy::KeepOptimistic,
                _ => warn!(value = %flag, "Ignoring invalid {}", ENV_ROLLBACK),
            }
        }
    }

    pub fn api_base_url(&self) -> &str {
        self.api_base_url.as_deref().unwrap_or(DEFAULT_API_BASE_URL)
    }

    pub fn page_size(&self) -> usize {
        self.page_size.unwrap_or(DEFAULT_PAGE_SIZE)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS))
    }
}
