//! File-based client configuration
//!
//! Retry, timeout and rate-limit tuning, loadable from a JSON file and
//! updatable at runtime through `ClientConfigUpdate`

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Token-bucket settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitConfig {
    /// Admissions per window (default: 20)
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    /// Window length in milliseconds (default: 1000)
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,
}

fn default_max_requests() -> u32 {
    crate::services::rate_limiter::DEFAULT_MAX_REQUESTS
}

fn default_window_ms() -> u64 {
    1000
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_ms: default_window_ms(),
        }
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    /// Overlay the fields present in `update`
    pub fn merged(&self, update: &RateLimitUpdate) -> Self {
        Self {
            max_requests: update.max_requests.unwrap_or(self.max_requests),
            window_ms: update.window_ms.unwrap_or(self.window_ms),
        }
    }
}

/// Partial token-bucket update; absent fields keep their current value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_requests: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_ms: Option<u64>,
}

/// Client tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    /// Retries after the first attempt (default: 3)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base backoff delay in milliseconds (default: 1000)
    #[serde(default = "default_base_delay")]
    pub base_delay: u64,

    /// Backoff cap in milliseconds (default: 10000)
    #[serde(default = "default_max_delay")]
    pub max_delay: u64,

    /// Per-call timeout in milliseconds (default: 30000)
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Emit per-call diagnostics (default: true)
    #[serde(default = "default_true")]
    pub logging: bool,
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay() -> u64 {
    1000
}

fn default_max_delay() -> u64 {
    10_000
}

fn default_timeout() -> u64 {
    30_000
}

fn default_true() -> bool {
    true
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay: default_base_delay(),
            max_delay: default_max_delay(),
            timeout: default_timeout(),
            rate_limit: RateLimitConfig::default(),
            logging: default_true(),
        }
    }
}

/// Partial update accepted by `BotClient::configure`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfigUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_delay: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_delay: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimitUpdate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<bool>,
}

impl ClientConfig {
    /// Load configuration from JSON file
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading client configuration from: {:?}", path);

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: ClientConfig =
            serde_json::from_str(&content).with_context(|| "Failed to parse config JSON")?;

        config.validate()?;

        debug!(
            "Loaded client config: {} retries, {} req/{}ms",
            config.max_retries, config.rate_limit.max_requests, config.rate_limit.window_ms
        );
        Ok(config)
    }

    /// Load configuration from default locations
    /// Searches in order:
    /// 1. ~/.config/botgate/botgate.json
    /// 2. ./botgate.json
    ///
    /// Falls back to built-in defaults when neither exists.
    pub fn load_default() -> Result<Self> {
        if let Some(home) = dirs::home_dir() {
            let config_path = home.join(".config").join("botgate").join("botgate.json");
            if config_path.exists() {
                return Self::load(&config_path);
            }
        }

        let local_path = Path::new("botgate.json");
        if local_path.exists() {
            return Self::load(local_path);
        }

        debug!("No client configuration file found, using defaults");
        Ok(Self::default())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.timeout == 0 {
            anyhow::bail!("Timeout cannot be 0");
        }

        if self.base_delay > self.max_delay {
            anyhow::bail!(
                "Base delay ({}ms) cannot exceed max delay ({}ms)",
                self.base_delay,
                self.max_delay
            );
        }

        if self.rate_limit.max_requests == 0 {
            anyhow::bail!("Rate limit maxRequests must be greater than 0");
        }

        if self.rate_limit.window_ms == 0 {
            anyhow::bail!("Rate limit windowMs must be greater than 0");
        }

        Ok(())
    }

    /// Apply a partial update, returning the merged configuration
    pub fn merged(&self, update: &ClientConfigUpdate) -> Result<Self> {
        let merged = Self {
            max_retries: update.max_retries.unwrap_or(self.max_retries),
            base_delay: update.base_delay.unwrap_or(self.base_delay),
            max_delay: update.max_delay.unwrap_or(self.max_delay),
            timeout: update.timeout.unwrap_or(self.timeout),
            rate_limit: match &update.rate_limit {
                Some(rate_limit) => self.rate_limit.merged(rate_limit),
                None => self.rate_limit,
            },
            logging: update.logging.unwrap_or(self.logging),
        };
        merged.validate()?;
        Ok(merged)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout)
    }

    /// `min(base_delay * 2^attempt, max_delay)`
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 2_u64.checked_pow(attempt).unwrap_or(u64::MAX);
        let delay = self.base_delay.saturating_mul(factor).min(self.max_delay);
        Duration::from_millis(delay)
    }
}
