//! Bot API gateway library
//!
//! Rate-limited, retrying client for chat-platform Bot APIs, with batch and broadcast dispatch

pub mod config;
pub mod models;
pub mod services;
pub mod utils;

#[cfg(test)]
mod tests;

// Re-export common types
pub use config::{ClientConfig, ClientConfigUpdate, Settings};
pub use models::{ApiResponse, BatchOptions, BatchReport, CallParams, ChatId, OutboundMessage};
pub use services::{ApiTransport, BotClient, Dispatcher, HttpTransport, RateLimiter};
pub use utils::error::{ApiError, ApiResult, ErrorKind};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Library description
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get version information
pub fn version_info() -> String {
    format!("{} v{} - {}", NAME, VERSION, DESCRIPTION)
}
