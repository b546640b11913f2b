//! Batch and broadcast dispatch
//!
//! Sends many payloads through one `BotClient`, either strictly in order with a pause
//! between items, or in chunks of `concurrency` calls that run together. Per-item
//! failures are recorded, never propagated.

use super::client::BotClient;
use crate::models::api::{CallParams, ChatId};
use crate::models::batch::{BatchOptions, BatchReport, ItemResult, OutboundMessage};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, info_span, warn, Instrument};

/// One unit of work with its position in the caller's input
struct Job {
    index: usize,
    target: ChatId,
    method: String,
    params: CallParams,
}

/// Batch/broadcast dispatcher over a shared client
#[derive(Debug, Clone)]
pub struct Dispatcher {
    client: Arc<BotClient>,
}

impl Dispatcher {
    pub fn new(client: Arc<BotClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<BotClient> {
        &self.client
    }

    /// Send every item to one target
    pub async fn send_batch(
        &self,
        items: &[OutboundMessage],
        target: &ChatId,
        options: &BatchOptions,
    ) -> BatchReport {
        let jobs = items
            .iter()
            .enumerate()
            .map(|(index, item)| Job {
                index,
                target: target.clone(),
                method: item.method.clone(),
                params: item.for_target(target),
            })
            .collect();

        self.run("batch", jobs, options).await
    }

    /// Send one payload to every target
    pub async fn send_broadcast(
        &self,
        payload: &OutboundMessage,
        targets: &[ChatId],
        options: &BatchOptions,
    ) -> BatchReport {
        let jobs = targets
            .iter()
            .enumerate()
            .map(|(index, target)| Job {
                index,
                target: target.clone(),
                method: payload.method.clone(),
                params: payload.for_target(target),
            })
            .collect();

        self.run("broadcast", jobs, options).await
    }

    async fn run(&self, mode: &'static str, jobs: Vec<Job>, options: &BatchOptions) -> BatchReport {
        let report = BatchReport::begin(jobs.len());
        let span = info_span!(
            "batch",
            batch_id = %report.batch_id,
            mode,
            total = jobs.len(),
            concurrency = options.effective_concurrency()
        );

        async move {
            let report = if options.effective_concurrency() == 1 {
                self.run_sequential(jobs, options, report).await
            } else {
                self.run_chunked(jobs, options, report).await
            };
            let report = report.finish();

            info!(
                "Batch finished: {} successful, {} failed, {} skipped{}",
                report.successful,
                report.failed,
                report.skipped,
                if report.cancelled { " (cancelled)" } else { "" }
            );
            report
        }
        .instrument(span)
        .await
    }

    async fn run_sequential(
        &self,
        jobs: Vec<Job>,
        options: &BatchOptions,
        mut report: BatchReport,
    ) -> BatchReport {
        let last = jobs.len().saturating_sub(1);

        for (position, job) in jobs.into_iter().enumerate() {
            if options.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let result = self.dispatch(job).await;
            let failed = !result.success;
            report.record(result);

            if failed && options.stop_on_error {
                warn!("Stopping batch after failure at item {}", position);
                break;
            }

            if position < last && !pause(options).await {
                report.cancelled = true;
                break;
            }
        }

        report
    }

    async fn run_chunked(
        &self,
        jobs: Vec<Job>,
        options: &BatchOptions,
        mut report: BatchReport,
    ) -> BatchReport {
        let size = options.effective_concurrency();
        let mut remaining = jobs.into_iter().peekable();

        while remaining.peek().is_some() {
            if options.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let chunk: Vec<Job> = remaining.by_ref().take(size).collect();
            debug!("Dispatching chunk of {} items", chunk.len());

            // join_all keeps input order regardless of completion order
            let results = join_all(chunk.into_iter().map(|job| self.dispatch(job))).await;
            let chunk_failed = results.iter().any(|r| !r.success);
            for result in results {
                report.record(result);
            }

            if chunk_failed && options.stop_on_error {
                warn!("Stopping batch after a failed chunk");
                break;
            }

            if remaining.peek().is_some() && !pause(options).await {
                report.cancelled = true;
                break;
            }
        }

        report
    }

    async fn dispatch(&self, job: Job) -> ItemResult {
        match self.client.execute(&job.method, &job.params).await {
            Ok(result) => ItemResult {
                index: job.index,
                success: true,
                target: job.target,
                message_id: result.get("message_id").and_then(|id| id.as_i64()),
                error: None,
                error_code: None,
            },
            Err(error) => {
                debug!("Item {} to {} failed: {}", job.index, job.target, error);
                ItemResult {
                    index: job.index,
                    success: false,
                    target: job.target,
                    message_id: None,
                    error: Some(error.user_message()),
                    error_code: error.status(),
                }
            }
        }
    }
}

/// Sleep between items; returns false if the batch was cancelled meanwhile
async fn pause(options: &BatchOptions) -> bool {
    let delay = options.delay_between();
    match &options.cancel {
        Some(token) => {
            tokio::select! {
                _ = token.cancelled() => false,
                _ = sleep_if_nonzero(delay) => true,
            }
        }
        None => {
            sleep_if_nonzero(delay).await;
            true
        }
    }
}

async fn sleep_if_nonzero(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
