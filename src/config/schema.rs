//! Configuration schema for tokencache
//!
//! Configuration is stored at `~/.config/tokencache/config.toml`

use crate::cache::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Cache file settings
    pub cache: CacheConfig,

    /// Write retry settings
    pub retry: RetryConfig,
}

impl Config {
    /// Cache file to use when no path is given on the command line
    pub fn cache_path(&self) -> PathBuf {
        self.cache
            .path
            .clone()
            .unwrap_or_else(CacheConfig::default_path)
    }

    /// Write retry budget
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            Duration::from_millis(self.retry.total_ms),
            Duration::from_millis(self.retry.delay_ms),
        )
    }
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Cache file configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache file path (defaults to the user cache directory)
    pub path: Option<PathBuf>,
}

impl CacheConfig {
    /// `<cache_dir>/tokencache/token.json`
    pub fn default_path() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tokencache")
            .join("token.json")
    }
}

/// Retry budget for contended writes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total time budget in milliseconds
    pub total_ms: u64,

    /// Delay between attempts in milliseconds
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            total_ms: RetryPolicy::DEFAULT_TOTAL.as_millis() as u64,
            delay_ms: RetryPolicy::DEFAULT_DELAY.as_millis() as u64,
        }
    }
}
