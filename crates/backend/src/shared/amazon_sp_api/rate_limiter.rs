use once_cell::sync::Lazy;
use rand::Rng;
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Semaphore;

use super::types::{SpApiError, NETWORK_ERROR, TIMEOUT_ERROR};

pub const MAX_RETRIES_EXCEEDED: &str = "MAX_RETRIES_EXCEEDED";

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_delay_ms: 1000,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
        }
    }
}

/// Exponential backoff with jitter around a single SP-API operation
#[derive(Debug, Clone, Default)]
pub struct RateLimiter {
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self { config }
    }

    /// Runs `op` at most `max_retries` times in total (at least once). Errors
    /// that are neither throttling nor transient are returned on the first
    /// occurrence.
    pub async fn execute_with_retry<T, F, Fut>(
        &self,
        operation: &str,
        mut op: F,
    ) -> Result<T, SpApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SpApiError>>,
    {
        let max_retries = self.config.max_retries.max(1);
        let mut last_error: Option<SpApiError> = None;

        for attempt in 0..max_retries {
            tracing::debug!(
                "SP-API {} attempt {}/{}",
                operation,
                attempt + 1,
                max_retries
            );
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    let rate_limited = is_rate_limit_error(&err);
                    if !rate_limited && !is_retryable_error(&err) {
                        tracing::error!("SP-API {} failed: {}", operation, err);
                        return Err(err);
                    }
                    if attempt + 1 < max_retries {
                        let jitter = rand::thread_rng().gen_range(0.0..1000.0);
                        let delay = self.delay_for(attempt, jitter);
                        tracing::warn!(
                            "SP-API {}: {} ({}), retrying in {} ms",
                            operation,
                            if rate_limited { "rate limited" } else { "transient error" },
                            err,
                            delay.as_millis()
                        );
                        tokio::time::sleep(delay).await;
                    }
                    last_error = Some(err);
                }
            }
        }

        let last_message = last_error
            .as_ref()
            .map(|e| e.message.clone())
            .unwrap_or_default();
        tracing::error!("SP-API {}: all {} retries exhausted", operation, max_retries);
        let mut error = SpApiError::new(
            MAX_RETRIES_EXCEEDED,
            format!("Failed after {} retries: {}", max_retries, last_message),
        );
        if let Some(last) = last_error {
            error.status_code = last.status_code;
            error.details = last.details;
        }
        Err(error)
    }

    /// min(initial * multiplier^attempt + jitter, max)
    pub fn delay_for(&self, attempt: u32, jitter_ms: f64) -> Duration {
        let exponential = self.config.initial_delay_ms as f64
            * self.config.backoff_multiplier.powi(attempt as i32);
        let total = (exponential + jitter_ms).min(self.config.max_delay_ms as f64);
        Duration::from_millis(total as u64)
    }
}

pub fn is_rate_limit_error(err: &SpApiError) -> bool {
    if err.code == "QuotaExceeded" || err.code == "RequestThrottled" {
        return true;
    }
    if err.status_code == Some(429) {
        return true;
    }
    let message = err.message.to_lowercase();
    message.contains("quota") || message.contains("throttl") || message.contains("rate limit")
}

pub fn is_retryable_error(err: &SpApiError) -> bool {
    if is_rate_limit_error(err) {
        return true;
    }
    match err.status_code {
        Some(status) if status >= 500 || status == 408 => true,
        Some(_) => false,
        None => err.code == NETWORK_ERROR || err.code == TIMEOUT_ERROR,
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct QueueStatus {
    pub queued: usize,
    pub running: usize,
}

/// Caps the number of SP-API calls in flight across the process
pub struct RequestQueue {
    semaphore: Semaphore,
    queued: AtomicUsize,
    running: AtomicUsize,
}

impl RequestQueue {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            semaphore: Semaphore::new(max_concurrent),
            queued: AtomicUsize::new(0),
            running: AtomicUsize::new(0),
        }
    }

    pub async fn run<T, Fut>(&self, fut: Fut) -> T
    where
        Fut: Future<Output = T>,
    {
        self.queued.fetch_add(1, Ordering::SeqCst);
        // The semaphore is never closed, so acquire cannot fail.
        let permit = self.semaphore.acquire().await.ok();
        self.queued.fetch_sub(1, Ordering::SeqCst);
        self.running.fetch_add(1, Ordering::SeqCst);

        let result = fut.await;

        self.running.fetch_sub(1, Ordering::SeqCst);
        drop(permit);
        result
    }

    pub fn status(&self) -> QueueStatus {
        QueueStatus {
            queued: self.queued.load(Ordering::SeqCst),
            running: self.running.load(Ordering::SeqCst),
        }
    }
}

pub static REQUEST_QUEUE: Lazy<RequestQueue> = Lazy::new(|| RequestQueue::new(5));

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use std::sync::Arc;

    fn fast_limiter(max_retries: u32) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            max_retries,
            initial_delay_ms: 1,
            max_delay_ms: 2,
            backoff_multiplier: 2.0,
        })
    }

    #[test]
    fn delay_grows_and_is_capped() {
        let limiter = RateLimiter::default();
        assert_eq!(limiter.delay_for(0, 0.0), Duration::from_millis(1000));
        assert_eq!(limiter.delay_for(2, 500.0), Duration::from_millis(4500));
        assert_eq!(limiter.delay_for(10, 999.0), Duration::from_millis(30_000));
    }

    #[test]
    fn classifies_rate_limit_errors() {
        assert!(is_rate_limit_error(&SpApiError::new("QuotaExceeded", "x")));
        assert!(is_rate_limit_error(&SpApiError::new("X", "y").with_status(429)));
        assert!(is_rate_limit_error(&SpApiError::new("X", "Request was Throttled")));
        assert!(!is_rate_limit_error(&SpApiError::new("X", "bad input").with_status(400)));
    }

    #[test]
    fn classifies_retryable_errors() {
        assert!(is_retryable_error(&SpApiError::new("X", "boom").with_status(503)));
        assert!(is_retryable_error(&SpApiError::new("X", "slow").with_status(408)));
        assert!(is_retryable_error(&SpApiError::new(NETWORK_ERROR, "reset")));
        assert!(!is_retryable_error(&SpApiError::new("X", "forbidden").with_status(403)));
        assert!(!is_retryable_error(&SpApiError::new("LWA_TOKEN_ERROR", "nope")));
    }

    #[tokio::test]
    async fn non_retryable_error_fails_immediately() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result: Result<(), _> = fast_limiter(5)
            .execute_with_retry("test", || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(SpApiError::new("BAD", "invalid").with_status(400))
                }
            })
            .await;
        assert_eq!(result.unwrap_err().code, "BAD");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_until_exhausted() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result: Result<(), _> = fast_limiter(2)
            .execute_with_retry("test", || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(SpApiError::new("QuotaExceeded", "quota").with_status(429))
                }
            })
            .await;
        let err = result.unwrap_err();
        assert_eq!(err.code, MAX_RETRIES_EXCEEDED);
        assert_eq!(err.message, "Failed after 2 retries: quota");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn zero_retries_still_attempts_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result: Result<(), _> = fast_limiter(0)
            .execute_with_retry("test", || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(SpApiError::new("X", "server").with_status(500))
                }
            })
            .await;
        assert_eq!(result.unwrap_err().code, MAX_RETRIES_EXCEEDED);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn succeeds_after_transient_failure() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result = fast_limiter(3)
            .execute_with_retry("test", || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(SpApiError::new("X", "server").with_status(500))
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn queue_reports_idle_status() {
        let queue = RequestQueue::new(2);
        let value = queue.run(async { 7 }).await;
        assert_eq!(value, 7);
        let status = queue.status();
        assert_eq!(status.queued, 0);
        assert_eq!(status.running, 0);
    }
}
