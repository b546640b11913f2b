//! Application configuration settings
//!
//! Credentials and logging come from the environment; client tuning from an optional JSON file

use super::file::ClientConfig;
use crate::models::api::ChatId;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default Bot API host
pub const DEFAULT_API_BASE_URL: &str = "https://api.telegram.org";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Bot credential configuration
    pub bot: BotConfig,
    /// Retry, timeout and rate-limit tuning
    pub client: ClientConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Bot credential configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Bot token; calls fail with an auth error when absent
    pub token: Option<String>,
    /// API base URL
    pub base_url: String,
    /// Target used when a call does not name one
    pub default_chat_id: Option<ChatId>,
}

impl std::fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .field("default_chat_id", &self.default_chat_id)
            .finish()
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: None,
            base_url: DEFAULT_API_BASE_URL.to_string(),
            default_chat_id: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Log format (text/json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl Settings {
    /// Create a new configuration instance
    pub fn new() -> Result<Self> {
        // Load .env file if it exists
        dotenv::dotenv().ok();

        let client = match get_env("BOT_CONFIG_FILE") {
            Some(path) => ClientConfig::load(&PathBuf::from(path))
                .context("Failed to load BOT_CONFIG_FILE")?,
            None => ClientConfig::load_default()?,
        };

        let settings = Self {
            bot: BotConfig {
                token: get_env("BOT_TOKEN"),
                base_url: get_env_or_default("BOT_API_BASE_URL", DEFAULT_API_BASE_URL),
                default_chat_id: get_env("BOT_DEFAULT_CHAT_ID").map(ChatId::from),
            },
            client,
            logging: LoggingConfig {
                level: get_env_or_default("RUST_LOG", "info"),
                format: get_env_or_default("LOG_FORMAT", "text"),
            },
        };

        // Validate configuration
        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration validity
    pub fn validate(&self) -> Result<()> {
        if let Some(token) = &self.bot.token {
            if token.contains(char::is_whitespace) {
                anyhow::bail!("Bot token cannot contain whitespace characters");
            }
        }

        if !self.bot.base_url.starts_with("http") {
            anyhow::bail!("Invalid Bot API base URL format, should start with 'http'");
        }

        self.client.validate()?;

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            anyhow::bail!("Invalid log level: {}", self.logging.level);
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            anyhow::bail!("Invalid log format: {}", self.logging.format);
        }

        Ok(())
    }

    /// Whether a credential is configured
    pub fn has_token(&self) -> bool {
        self.bot.token.is_some()
    }
}

/// Get a non-empty environment variable
fn get_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Get environment variable or default value
fn get_env_or_default(key: &str, default: &str) -> String {
    get_env(key).unwrap_or_else(|| default.to_string())
}
