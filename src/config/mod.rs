//! Configuration management module
//!
//! Loads bot credentials from the environment and client tuning from JSON files

pub mod file;
pub mod settings;

pub use file::{ClientConfig, ClientConfigUpdate, RateLimitConfig, RateLimitUpdate};
pub use settings::{BotConfig, LoggingConfig, Settings};
