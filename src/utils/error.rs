//! Error handling module
//!
//! Defines the closed error taxonomy returned by every Bot API call

use std::time::Duration;
use thiserror::Error;

/// Retry hint used when a 429 arrives without any `retry_after` information
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Status code assigned to calls aborted by the per-call timeout
pub const TIMEOUT_STATUS: u16 = 408;

/// Bot API error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Missing or rejected credential
    #[error("Authentication failed: {message}")]
    Auth {
        message: String,
        status: Option<u16>,
        description: Option<String>,
    },

    /// Malformed request
    #[error("Request validation failed: {message}")]
    Validation {
        message: String,
        status: Option<u16>,
        description: Option<String>,
    },

    /// Client-side or server-side throttling
    #[error("Rate limit exceeded: {message}")]
    RateLimit {
        message: String,
        status: Option<u16>,
        description: Option<String>,
        /// Seconds the server asked us to wait
        retry_after: Option<u64>,
    },

    /// Any other HTTP, network or timeout failure
    #[error("Bot API error: {message}")]
    Generic {
        message: String,
        status: Option<u16>,
        description: Option<String>,
        /// Failure happened below HTTP (connect, body read, timeout)
        network: bool,
    },
}

/// Error kind discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Auth,
    Validation,
    RateLimit,
    Generic,
}

/// What the retry loop should do with a classified error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Try again; a server hint overrides the backoff formula when present
    Retryable { delay_hint: Option<Duration> },
    /// Surface to the caller immediately
    Fatal,
}

impl ApiError {
    /// Map a transport status or application `error_code` onto the taxonomy
    pub fn from_status(status: u16, description: Option<String>, retry_after: Option<u64>) -> Self {
        let message = match &description {
            Some(desc) => format!("{} - {}", status, desc),
            None => format!("status {}", status),
        };

        match status {
            429 => ApiError::RateLimit {
                message,
                status: Some(status),
                description,
                retry_after: Some(retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS)),
            },
            401 | 403 => ApiError::Auth {
                message,
                status: Some(status),
                description,
            },
            400 => ApiError::Validation {
                message,
                status: Some(status),
                description,
            },
            _ => ApiError::Generic {
                message,
                status: Some(status),
                description,
                network: false,
            },
        }
    }

    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Auth { .. } => ErrorKind::Auth,
            ApiError::Validation { .. } => ErrorKind::Validation,
            ApiError::RateLimit { .. } => ErrorKind::RateLimit,
            ApiError::Generic { .. } => ErrorKind::Generic,
        }
    }

    /// Numeric status or application error code, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Auth { status, .. }
            | ApiError::Validation { status, .. }
            | ApiError::RateLimit { status, .. }
            | ApiError::Generic { status, .. } => *status,
        }
    }

    /// Server-supplied description, if any
    pub fn description(&self) -> Option<&str> {
        match self {
            ApiError::Auth { description, .. }
            | ApiError::Validation { description, .. }
            | ApiError::RateLimit { description, .. }
            | ApiError::Generic { description, .. } => description.as_deref(),
        }
    }

    /// Retry hint in seconds; only rate-limit errors carry one
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            ApiError::RateLimit { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Returns true for transient errors that may succeed on retry
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::RateLimit { .. } => true,
            ApiError::Generic { network: true, .. } => true,
            ApiError::Generic { status, .. } => status.is_some_and(|s| s >= 500),
            ApiError::Auth { .. } | ApiError::Validation { .. } => false,
        }
    }

    /// Classify for the retry loop
    pub fn disposition(&self) -> Disposition {
        if !self.is_retryable() {
            return Disposition::Fatal;
        }

        Disposition::Retryable {
            delay_hint: self.retry_after().map(Duration::from_secs),
        }
    }

    /// Get error type string
    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::Auth { .. } => "auth_error",
            ApiError::Validation { .. } => "validation_error",
            ApiError::RateLimit { .. } => "rate_limit_error",
            ApiError::Generic { .. } => "api_error",
        }
    }

    /// Text suitable for showing to a chat user or operator
    pub fn user_message(&self) -> String {
        match self.description() {
            Some(desc) => desc.to_string(),
            None => self.to_string(),
        }
    }

    /// Whether detailed error information should be logged
    pub fn should_log_details(&self) -> bool {
        !matches!(self, ApiError::Auth { .. })
    }
}

/// Result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Error construction helpers
pub mod helpers {
    use super::*;

    /// Create authentication error
    pub fn auth_error(message: impl Into<String>) -> ApiError {
        ApiError::Auth {
            message: message.into(),
            status: None,
            description: None,
        }
    }

    /// Create validation error
    pub fn validation_error(message: impl Into<String>) -> ApiError {
        ApiError::Validation {
            message: message.into(),
            status: None,
            description: None,
        }
    }

    /// Create network-level error
    pub fn network_error(message: impl Into<String>) -> ApiError {
        ApiError::Generic {
            message: message.into(),
            status: None,
            description: None,
            network: true,
        }
    }

    /// Create timeout error
    pub fn timeout_error(timeout: Duration) -> ApiError {
        ApiError::Generic {
            message: format!("request timed out after {}ms", timeout.as_millis()),
            status: Some(TIMEOUT_STATUS),
            description: None,
            network: true,
        }
    }

    /// Create error for a response we could not interpret
    pub fn malformed_response_error(status: u16, message: impl Into<String>) -> ApiError {
        ApiError::Generic {
            message: message.into(),
            status: Some(status),
            description: None,
            network: false,
        }
    }
}
