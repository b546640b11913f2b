//! Logging utilities
//!
//! Subscriber setup and helpers that keep secrets and large payloads out of log lines

use crate::config::LoggingConfig;
use serde_json::Value;

/// Longest string value kept in a parameter summary
const MAX_LOGGED_VALUE_LEN: usize = 200;

/// Initialize logging system
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging(config: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_new(&config.level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let result = if config.format == "json" {
        // JSON format logs (production environment)
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_current_span(false)
            .with_span_list(false)
            .with_writer(std::io::stderr)
            .try_init()
    } else {
        // Human readable format (development environment)
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init()
    };

    if result.is_ok() {
        tracing::info!("Logging system initialized");
    }
}

/// Mask a bot token wherever it appears, e.g. in a request URL
pub fn redact_token(text: &str, token: &str) -> String {
    if token.is_empty() {
        return text.to_string();
    }
    text.replace(token, "[REDACTED]")
}

/// Truncate a string with a note about original length
fn truncate_content(s: &str, max_len: usize) -> String {
    if s.chars().count() > max_len {
        let kept: String = s.chars().take(max_len).collect();
        format!("{}... ({} chars truncated)", kept, s.chars().count() - max_len)
    } else {
        s.to_string()
    }
}

/// Create a filtered summary of a call body for logging
/// Keeps the key order but truncates long strings and collapses nested values
pub fn params_log_summary(body: &Value) -> Value {
    match body {
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(key, value)| {
                    let summary = match value {
                        Value::String(s) => Value::String(truncate_content(s, MAX_LOGGED_VALUE_LEN)),
                        Value::Array(items) => Value::String(format!("[...{} items]", items.len())),
                        Value::Object(inner) => Value::String(format!("{{...{} keys}}", inner.len())),
                        other => other.clone(),
                    };
                    (key.clone(), summary)
                })
                .collect(),
        ),
        other => other.clone(),
    }
}
