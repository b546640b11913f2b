//! Token-bucket admission gate
//!
//! Tokens are replenished lazily from the elapsed time on each admission check;
//! nothing runs in the background. One instance is shared by every call a client makes.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Default admissions per window, kept below the documented 30/s ceiling
pub const DEFAULT_MAX_REQUESTS: u32 = 20;

/// Default window length
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(1);

#[derive(Debug)]
struct BucketState {
    tokens_remaining: u32,
    window_started_at: Instant,
    max_tokens: u32,
    window: Duration,
}

/// Shared token bucket
#[derive(Debug)]
pub struct RateLimiter {
    state: Mutex<BucketState>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW)
    }
}

impl RateLimiter {
    /// Create a full bucket. Zero values are clamped to 1 token / 1 ms.
    pub fn new(max_tokens: u32, window: Duration) -> Self {
        let max_tokens = max_tokens.max(1);
        Self {
            state: Mutex::new(BucketState {
                tokens_remaining: max_tokens,
                window_started_at: Instant::now(),
                max_tokens,
                window: window.max(Duration::from_millis(1)),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BucketState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("Rate limiter lock poisoned");
                poisoned.into_inner()
            }
        }
    }

    /// Try to take one token.
    ///
    /// Returns `Duration::ZERO` when admitted. Otherwise returns how long until the
    /// next window boundary; nothing is consumed and the caller must ask again.
    pub fn admit(&self) -> Duration {
        let now = Instant::now();
        let mut state = self.lock();

        let elapsed = now.saturating_duration_since(state.window_started_at);
        let windows = elapsed.as_millis() / state.window.as_millis();
        if windows > 0 {
            let tokens_to_add = u32::try_from(windows)
                .unwrap_or(u32::MAX)
                .saturating_mul(state.max_tokens);
            state.tokens_remaining = state
                .tokens_remaining
                .saturating_add(tokens_to_add)
                .min(state.max_tokens);
            state.window_started_at = now;
        }

        if state.tokens_remaining > 0 {
            state.tokens_remaining -= 1;
            return Duration::ZERO;
        }

        let wait = state.window.saturating_sub(elapsed);
        debug!("Rate limit: bucket empty, next window in {}ms", wait.as_millis());
        wait
    }

    /// Wait until a token is granted
    pub async fn acquire(&self) {
        loop {
            let wait = self.admit();
            if wait.is_zero() {
                return;
            }
            tokio::time::sleep(wait).await;
        }
    }

    /// Tokens left in the current window
    pub fn tokens_remaining(&self) -> u32 {
        self.lock().tokens_remaining
    }

    pub fn max_tokens(&self) -> u32 {
        self.lock().max_tokens
    }

    pub fn window(&self) -> Duration {
        self.lock().window
    }

    /// Change capacity and window; the bucket starts over full
    pub fn reconfigure(&self, max_tokens: u32, window: Duration) {
        let mut state = self.lock();
        state.max_tokens = max_tokens.max(1);
        state.window = window.max(Duration::from_millis(1));
        state.tokens_remaining = state.max_tokens;
        state.window_started_at = Instant::now();
    }
}
