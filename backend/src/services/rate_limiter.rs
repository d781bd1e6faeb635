//! Rate Limiter Service
//!
//! Per-caller admission control using a sliding window of admission
//! timestamps. One lock guards every key; each key's window is pruned
//! from the oldest end before the capacity check.

use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

/// Errors that can occur during rate limiting
#[derive(Debug, Error)]
pub enum RateLimitError {
    #[error("Rate limit exceeded. Retry after {retry_after} seconds")]
    RateLimited { retry_after: u64 },
}

/// Window configuration shared by every caller key
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests allowed in the window
    pub max_requests: u32,
    /// Window duration in seconds
    pub window_secs: u64,
}

/// Rate Limiter Service
///
/// Cloning shares the underlying state, so a single limiter built at startup
/// can be handed to every worker.
#[derive(Debug, Clone)]
pub struct RateLimiterService {
    config: RateLimitConfig,
    /// caller key -> admission timestamps, oldest first
    state: Arc<Mutex<HashMap<String, VecDeque<DateTime<Utc>>>>>,
}

impl RateLimiterService {
    /// Create a new rate limiter with the given configuration
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            state: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn window(&self) -> Duration {
        Duration::seconds(self.config.window_secs as i64)
    }

    /// Check if a request is allowed and record it if so
    ///
    /// Returns Ok(()) if the request is admitted, or Err with retry_after if rate limited.
    pub async fn check_and_record(&self, key: &str) -> Result<(), RateLimitError> {
        self.check_and_record_at(key, Utc::now()).await
    }

    pub(crate) async fn check_and_record_at(
        &self,
        key: &str,
        now: DateTime<Utc>,
    ) -> Result<(), RateLimitError> {
        let window = self.window();
        let mut state = self.state.lock().await;
        let bucket = state.entry(key.to_string()).or_default();

        // Timestamps are appended in order, so expired entries sit at the front.
        while bucket.front().is_some_and(|ts| now - *ts > window) {
            bucket.pop_front();
        }

        if bucket.len() >= self.config.max_requests as usize {
            let retry_after = match bucket.front() {
                Some(oldest) => {
                    let remaining_ms = (window - (now - *oldest)).num_milliseconds();
                    (remaining_ms as f64 / 1000.0).ceil().max(1.0) as u64
                }
                None => self.config.window_secs.max(1),
            };
            return Err(RateLimitError::RateLimited { retry_after });
        }

        bucket.push_back(now);
        Ok(())
    }
}
