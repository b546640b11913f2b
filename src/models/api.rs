//! Bot API call and response shapes
//!
//! Call parameters sent to the gateway and the JSON envelope it answers with

use crate::utils::error::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Chat/target identifier: numeric id or `@username`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatId {
    Id(i64),
    Username(String),
}

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        ChatId::Id(id)
    }
}

impl From<&str> for ChatId {
    fn from(value: &str) -> Self {
        match value.trim().parse::<i64>() {
            Ok(id) => ChatId::Id(id),
            Err(_) => ChatId::Username(value.trim().to_string()),
        }
    }
}

impl From<String> for ChatId {
    fn from(value: String) -> Self {
        ChatId::from(value.as_str())
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatId::Id(id) => write!(f, "{}", id),
            ChatId::Username(name) => write!(f, "{}", name),
        }
    }
}

impl From<&ChatId> for Value {
    fn from(chat: &ChatId) -> Self {
        match chat {
            ChatId::Id(id) => Value::from(*id),
            ChatId::Username(name) => Value::from(name.as_str()),
        }
    }
}

/// Parameters of one Bot API call
///
/// Keys keep insertion order. The optional target and thread are merged into the
/// body as `chat_id` / `message_thread_id` unless the caller set those keys directly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallParams {
    #[serde(default)]
    pub fields: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<ChatId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<i64>,
}

impl CallParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON object; anything else is a validation error
    pub fn from_value(value: Value) -> ApiResult<Self> {
        match value {
            Value::Object(fields) => Ok(Self {
                fields,
                ..Self::default()
            }),
            Value::Null => Ok(Self::default()),
            other => Err(crate::utils::error::helpers::validation_error(format!(
                "call parameters must be a JSON object, got {}",
                other
            ))),
        }
    }

    /// Add a field
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Set the target chat
    pub fn target(mut self, chat: impl Into<ChatId>) -> Self {
        self.target = Some(chat.into());
        self
    }

    /// Set the thread inside the target chat
    pub fn thread(mut self, thread_id: i64) -> Self {
        self.thread_id = Some(thread_id);
        self
    }

    /// Whether a destination is set either way
    pub fn has_target(&self) -> bool {
        self.target.is_some() || self.fields.contains_key("chat_id")
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// JSON body for the wire
    pub fn to_body(&self) -> Value {
        let mut body = self.fields.clone();
        if let Some(target) = &self.target {
            body.entry("chat_id").or_insert_with(|| Value::from(target));
        }
        if let Some(thread_id) = self.thread_id {
            body.entry("message_thread_id")
                .or_insert_with(|| Value::from(thread_id));
        }
        Value::Object(body)
    }
}

/// Extra fields the gateway attaches to some failures
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migrate_to_chat_id: Option<i64>,
}

/// Bot API response envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T = Value> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<ResponseParameters>,
}

impl<T> ApiResponse<T> {
    pub fn success(result: T) -> Self {
        Self {
            ok: true,
            result: Some(result),
            description: None,
            error_code: None,
            parameters: None,
        }
    }

    pub fn failure(error: &ApiError) -> Self {
        Self {
            ok: false,
            result: None,
            description: Some(error.user_message()),
            error_code: error.status(),
            parameters: error.retry_after().map(|secs| ResponseParameters {
                retry_after: Some(secs),
                migrate_to_chat_id: None,
            }),
        }
    }
}

impl<T> From<ApiResult<T>> for ApiResponse<T> {
    fn from(result: ApiResult<T>) -> Self {
        match result {
            Ok(value) => ApiResponse::success(value),
            Err(err) => ApiResponse::failure(&err),
        }
    }
}
