//! Retry with exponential backoff for rate-limited APIs.
//!
//! Retries HTTP 429, 5xx, timeouts and connection failures. A 429 with a
//! numeric `Retry-After` waits that long plus one second.

use std::time::Duration;

use marquee_core::config::RetryConfig;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{RequestBuilder, Response, StatusCode};

/// Upper bound on any single wait.
const MAX_DELAY: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first request.
    pub max_attempts: u32,
    /// Wait after the first failure; doubles on each further failure.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_delay: Duration::from_secs(config.base_delay_secs),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
        }
    }

    /// Wait before retrying after failed attempt `attempt` (0-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).min(MAX_DELAY)
    }
}

/// Seconds from a numeric `Retry-After` header, plus one.
pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let secs: u64 = headers.get(RETRY_AFTER)?.to_str().ok()?.trim().parse().ok()?;
    Some(Duration::from_secs(secs.saturating_add(1)).min(MAX_DELAY))
}

fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Send the request built by `build`, retrying per `policy`.
///
/// On the last attempt the response is returned as-is, so callers still see
/// the final 429/5xx through their normal status check.
pub async fn send_with_retry<F>(policy: &RetryPolicy, build: F) -> Result<Response, reqwest::Error>
where
    F: Fn() -> RequestBuilder,
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        let last = attempt + 1 >= attempts;
        match build().send().await {
            Ok(resp) if last || !is_retryable_status(resp.status()) => return Ok(resp),
            Ok(resp) => {
                let status = resp.status();
                let wait = if status == StatusCode::TOO_MANY_REQUESTS {
                    retry_after(resp.headers()).unwrap_or_else(|| policy.backoff(attempt))
                } else {
                    policy.backoff(attempt)
                };
                tracing::warn!(
                    status = status.as_u16(),
                    attempt = attempt + 1,
                    wait_secs = wait.as_secs(),
                    "Retrying after HTTP error"
                );
                tokio::time::sleep(wait).await;
            }
            Err(e) if !last && (e.is_timeout() || e.is_connect()) => {
                let wait = policy.backoff(attempt);
                tracing::warn!(
                    error = %e,
                    attempt = attempt + 1,
                    wait_secs = wait.as_secs(),
                    "Retrying after request failure"
                );
                tokio::time::sleep(wait).await;
            }
            Err(e) => return Err(e),
        }
        attempt += 1;
    }
}
