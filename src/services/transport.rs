//! Bot API wire transport
//!
//! Performs the HTTP POST for one attempt and classifies the raw response

use crate::models::api::ApiResponse;
use crate::utils::error::{helpers, ApiError, ApiResult};
use crate::utils::logging::redact_token;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Status, hint and body of one HTTP exchange, before classification
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    /// Parsed `Retry-After` header, seconds
    pub retry_after: Option<u64>,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            retry_after: None,
            body: body.into(),
        }
    }

    /// Build from a JSON body
    pub fn json(status: u16, body: &Value) -> Self {
        Self::new(status, body.to_string())
    }

    pub fn with_retry_after(mut self, secs: u64) -> Self {
        self.retry_after = Some(secs);
        self
    }

    fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport for a single Bot API attempt
///
/// Implementations only report what came back. Network failures are returned as
/// network-level `ApiError::Generic`; status classification happens in `classify`.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    /// POST `body` to `method` using `token`
    async fn post(&self, token: &str, method: &str, body: &Value) -> ApiResult<RawResponse>;
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a new transport instance
    ///
    /// No client-wide timeout is set; the executor bounds each attempt itself.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(concat!("botgate/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Build the request URL
    pub fn method_url(&self, token: &str, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, token, method)
    }
}

#[async_trait]
impl ApiTransport for HttpTransport {
    async fn post(&self, token: &str, method: &str, body: &Value) -> ApiResult<RawResponse> {
        let url = self.method_url(token, method);
        debug!("POST {}", redact_token(&url, token));

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| helpers::network_error(redact_token(&e.to_string(), token)))?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());

        let body = response.text().await.map_err(|e| {
            helpers::network_error(format!(
                "failed to read response body: {}",
                redact_token(&e.to_string(), token)
            ))
        })?;

        Ok(RawResponse {
            status,
            retry_after,
            body,
        })
    }
}

/// Turn a raw response into the call result or a classified error
///
/// Non-2xx statuses map by status; a 2xx envelope with `ok: false` maps by its
/// `error_code` through the same table.
pub fn classify(raw: &RawResponse) -> ApiResult<Value> {
    let envelope = serde_json::from_str::<ApiResponse<Value>>(&raw.body).ok();

    if !raw.is_success() {
        let description = envelope.as_ref().and_then(|e| e.description.clone());
        let body_hint = envelope
            .as_ref()
            .and_then(|e| e.parameters.as_ref())
            .and_then(|p| p.retry_after);
        return Err(ApiError::from_status(
            raw.status,
            description,
            raw.retry_after.or(body_hint),
        ));
    }

    let envelope = envelope.ok_or_else(|| {
        helpers::malformed_response_error(raw.status, "response body is not a Bot API envelope")
    })?;

    if envelope.ok {
        return Ok(envelope.result.unwrap_or(Value::Null));
    }

    let retry_after = envelope.parameters.as_ref().and_then(|p| p.retry_after);
    match envelope.error_code {
        Some(code) => Err(ApiError::from_status(code, envelope.description, retry_after)),
        None => Err(ApiError::Generic {
            message: envelope
                .description
                .clone()
                .unwrap_or_else(|| "request failed without error code".to_string()),
            status: None,
            description: envelope.description,
            network: false,
        }),
    }
}
