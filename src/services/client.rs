//! Bot API client
//!
//! Single-call executor: waits on the shared rate limiter, bounds each attempt
//! with a timeout, classifies the response and retries transient failures

use super::rate_limiter::RateLimiter;
use super::transport::{classify, ApiTransport, HttpTransport};
use crate::config::{ClientConfig, ClientConfigUpdate, Settings};
use crate::models::api::{CallParams, ChatId};
use crate::models::telegram::{Message, User};
use crate::utils::error::{helpers, ApiError, ApiResult, Disposition};
use crate::utils::logging::params_log_summary;
use anyhow::Result;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Rate-limited, retrying Bot API client
pub struct BotClient {
    token: Option<String>,
    default_target: Option<ChatId>,
    transport: Arc<dyn ApiTransport>,
    limiter: Arc<RateLimiter>,
    config: RwLock<ClientConfig>,
}

impl std::fmt::Debug for BotClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotClient")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("default_target", &self.default_target)
            .field("limiter", &self.limiter)
            .field("config", &self.config())
            .finish()
    }
}

impl BotClient {
    /// Create an HTTP client from loaded settings
    pub fn new(settings: &Settings) -> Result<Self> {
        let transport = HttpTransport::new(settings.bot.base_url.clone())?;
        let client = Self::with_transport(
            settings.bot.token.clone(),
            settings.client.clone(),
            Arc::new(transport),
        );

        Ok(match &settings.bot.default_chat_id {
            Some(chat) => client.with_default_target(chat.clone()),
            None => client,
        })
    }

    /// Create a client over any transport
    pub fn with_transport(
        token: Option<String>,
        config: ClientConfig,
        transport: Arc<dyn ApiTransport>,
    ) -> Self {
        let limiter = RateLimiter::new(config.rate_limit.max_requests, config.rate_limit.window());
        Self {
            token,
            default_target: None,
            transport,
            limiter: Arc::new(limiter),
            config: RwLock::new(config),
        }
    }

    /// Target used by `send_message` when none is given
    pub fn with_default_target(mut self, target: impl Into<ChatId>) -> Self {
        self.default_target = Some(target.into());
        self
    }

    /// Share an existing limiter, e.g. between clients of one bot
    pub fn with_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn default_target(&self) -> Option<&ChatId> {
        self.default_target.as_ref()
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Snapshot of the current configuration
    pub fn config(&self) -> ClientConfig {
        match self.config.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Apply a partial configuration update
    ///
    /// Calls already in flight keep the configuration they started with.
    pub fn configure(&self, update: &ClientConfigUpdate) -> Result<()> {
        let mut guard = match self.config.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let merged = guard.merged(update)?;

        if update.rate_limit.is_some() {
            self.limiter
                .reconfigure(merged.rate_limit.max_requests, merged.rate_limit.window());
        }

        info!(
            "Client reconfigured: {} retries, {}-{}ms backoff, {}ms timeout, {} req/{}ms",
            merged.max_retries,
            merged.base_delay,
            merged.max_delay,
            merged.timeout,
            merged.rate_limit.max_requests,
            merged.rate_limit.window_ms
        );
        *guard = merged;
        Ok(())
    }

    /// Execute one Bot API call
    ///
    /// Never panics or escapes with anything but an `ApiError`; retryable failures are
    /// retried up to `max_retries` times before the last error is returned.
    pub async fn execute(&self, method: &str, params: &CallParams) -> ApiResult<Value> {
        let Some(token) = self.token.as_deref() else {
            return Err(helpers::auth_error("bot token is not configured"));
        };

        let config = self.config();
        let body = params.to_body();
        if config.logging {
            debug!("Bot API call {}: {}", method, params_log_summary(&body));
        }

        let mut attempt: u32 = 0;
        loop {
            self.limiter.acquire().await;

            let error = match self.attempt(token, method, &body, config.timeout()).await {
                Ok(result) => {
                    if config.logging {
                        debug!("Bot API call {} succeeded (attempt {})", method, attempt + 1);
                    }
                    return Ok(result);
                }
                Err(error) => error,
            };

            let delay = match error.disposition() {
                Disposition::Fatal => {
                    if config.logging {
                        warn!("Bot API call {} failed: {}", method, failure_detail(&error));
                    }
                    return Err(error);
                }
                Disposition::Retryable { .. } if attempt >= config.max_retries => {
                    if config.logging {
                        error!(
                            "Bot API call {} failed after {} attempts: {}",
                            method,
                            attempt + 1,
                            error
                        );
                    }
                    return Err(error);
                }
                Disposition::Retryable { delay_hint } => {
                    delay_hint.unwrap_or_else(|| config.backoff_delay(attempt))
                }
            };

            if config.logging {
                warn!(
                    "Bot API call {} failed: {}, retrying after {}ms (attempt {}/{})",
                    method,
                    error,
                    delay.as_millis(),
                    attempt + 1,
                    config.max_retries
                );
            }
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn attempt(
        &self,
        token: &str,
        method: &str,
        body: &Value,
        timeout: Duration,
    ) -> ApiResult<Value> {
        match tokio::time::timeout(timeout, self.transport.post(token, method, body)).await {
            Ok(Ok(raw)) => classify(&raw),
            Ok(Err(error)) => Err(error),
            Err(_) => Err(helpers::timeout_error(timeout)),
        }
    }

    /// Execute and deserialize the result
    pub async fn execute_as<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &CallParams,
    ) -> ApiResult<T> {
        let value = self.execute(method, params).await?;
        serde_json::from_value(value).map_err(|e| {
            helpers::malformed_response_error(200, format!("unexpected {} result: {}", method, e))
        })
    }

    /// Identity of the bot behind the token
    pub async fn get_me(&self) -> ApiResult<User> {
        self.execute_as("getMe", &CallParams::new()).await
    }

    /// Send a text message to `target`, or to the default target
    pub async fn send_message(&self, text: &str, target: Option<&ChatId>) -> ApiResult<Message> {
        let target = target.or(self.default_target.as_ref()).ok_or_else(|| {
            helpers::validation_error("no target chat given and no default target configured")
        })?;

        let params = CallParams::new().with("text", text).target(target.clone());
        self.execute_as("sendMessage", &params).await
    }

    /// Replace the text of a sent message
    pub async fn edit_message_text(
        &self,
        target: &ChatId,
        message_id: i64,
        text: &str,
    ) -> ApiResult<Message> {
        let params = CallParams::new()
            .target(target.clone())
            .with("message_id", message_id)
            .with("text", text);
        self.execute_as("editMessageText", &params).await
    }

    /// Delete a sent message
    pub async fn delete_message(&self, target: &ChatId, message_id: i64) -> ApiResult<bool> {
        let params = CallParams::new()
            .target(target.clone())
            .with("message_id", message_id);
        self.execute_as("deleteMessage", &params).await
    }
}

/// Log text for a failed call; auth failures report only their type and status
fn failure_detail(error: &ApiError) -> String {
    if error.should_log_details() {
        return error.to_string();
    }
    match error.status() {
        Some(status) => format!("{} (status {})", error.error_type(), status),
        None => error.error_type().to_string(),
    }
}
