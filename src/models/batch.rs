//! Batch and broadcast shapes

use super::api::{CallParams, ChatId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// One payload to dispatch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Bot API method, e.g. `sendMessage`
    pub method: String,
    #[serde(default)]
    pub params: CallParams,
}

impl OutboundMessage {
    pub fn new(method: impl Into<String>, params: CallParams) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }

    /// Plain `sendMessage` payload
    pub fn text(text: impl Into<String>) -> Self {
        Self::new("sendMessage", CallParams::new().with("text", text.into()))
    }

    /// Same payload aimed at `target`
    pub fn for_target(&self, target: &ChatId) -> CallParams {
        self.params.clone().target(target.clone())
    }
}

/// Pacing and failure policy of a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BatchOptions {
    /// Pause after each item (sequential) or each chunk (concurrent)
    pub delay_between_ms: u64,
    /// Stop after the first failure; concurrent mode checks at chunk boundaries
    pub stop_on_error: bool,
    /// Items in flight at once; 0 is treated as 1
    pub concurrency: usize,
    /// Abandon the rest of the batch when cancelled
    #[serde(skip)]
    pub cancel: Option<CancellationToken>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            delay_between_ms: 50,
            stop_on_error: false,
            concurrency: 1,
            cancel: None,
        }
    }
}

impl BatchOptions {
    pub fn delay_between(&self) -> Duration {
        Duration::from_millis(self.delay_between_ms)
    }

    pub fn effective_concurrency(&self) -> usize {
        self.concurrency.max(1)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|token| token.is_cancelled())
    }
}

/// Outcome of one item, keyed by its input position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemResult {
    pub index: usize,
    pub success: bool,
    pub target: ChatId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<u16>,
}

/// Aggregate outcome of a batch or broadcast
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub batch_id: Uuid,
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    /// Items never attempted because of early stop or cancellation
    pub skipped: usize,
    pub cancelled: bool,
    pub results: Vec<ItemResult>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BatchReport {
    pub(crate) fn begin(total: usize) -> Self {
        let now = Utc::now();
        Self {
            batch_id: Uuid::new_v4(),
            total,
            successful: 0,
            failed: 0,
            skipped: total,
            cancelled: false,
            results: Vec::with_capacity(total),
            started_at: now,
            finished_at: now,
        }
    }

    pub(crate) fn record(&mut self, result: ItemResult) {
        if result.success {
            self.successful += 1;
        } else {
            self.failed += 1;
        }
        self.skipped = self.total - self.successful - self.failed;
        self.results.push(result);
    }

    pub(crate) fn finish(mut self) -> Self {
        self.finished_at = Utc::now();
        self
    }

    /// Every item was attempted
    pub fn is_complete(&self) -> bool {
        self.successful + self.failed == self.total
    }

    pub fn failures(&self) -> impl Iterator<Item = &ItemResult> {
        self.results.iter().filter(|r| !r.success)
    }
}
