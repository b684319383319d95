//! Retrying fetch with exponential backoff
//!
//! Only rate limiting (HTTP 429) is retried. Every other failure is returned
//! immediately. Between attempts the fetch sleeps for
//! `initial_backoff * 2^attempt` plus a random jitter.

use crate::config::FetchOptions;
use crate::crawler::fetcher::{FetchResult, Fetcher};
use crate::ScrapeError;
use std::time::Duration;

/// Source of the random delay added to each backoff
pub trait Jitter: Send + Sync {
    /// Returns a delay in `[0, max)`; zero when `max` is zero
    fn jitter(&self, max: Duration) -> Duration;
}

/// Uniform random jitter from the thread-local generator
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomJitter;

impl Jitter for RandomJitter {
    fn jitter(&self, max: Duration) -> Duration {
        let max_ms = u64::try_from(max.as_millis()).unwrap_or(u64::MAX);
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::random_range(0..max_ms))
    }
}

/// Always adds the same delay (capped below `max`); for deterministic timing
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedJitter(pub Duration);

impl Jitter for FixedJitter {
    fn jitter(&self, max: Duration) -> Duration {
        if self.0 < max {
            self.0
        } else {
            max.saturating_sub(Duration::from_millis(1))
        }
    }
}

/// Attempt limits and delays for one fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_jitter: Duration,
}

impl RetryPolicy {
    /// Delay before the attempt following `attempt`, without jitter
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.initial_backoff.saturating_mul(factor)
    }

    /// Full sleep before the attempt following `attempt`: backoff plus jitter
    pub fn delay(&self, attempt: u32, jitter: &dyn Jitter) -> Duration {
        self.backoff(attempt).saturating_add(jitter.jitter(self.max_jitter))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::from(&FetchOptions::default())
    }
}

impl From<&FetchOptions> for RetryPolicy {
    fn from(options: &FetchOptions) -> Self {
        Self {
            max_retries: options.max_retries.max(1),
            initial_backoff: options.initial_backoff(),
            max_jitter: options.max_jitter(),
        }
    }
}

/// One pass through the retry loop
#[derive(Debug, Clone, Copy)]
pub struct FetchAttempt {
    /// Zero-based attempt index
    pub index: u32,
    /// Total time slept before this attempt
    pub elapsed_backoff: Duration,
    /// Status observed by this attempt, if any
    pub status: Option<u16>,
}

/// Fetches `url`, retrying while the server answers 429
///
/// # Returns
///
/// * `Ok(String)` - The body of the first successful attempt
/// * `Err(ScrapeError::Visit)` - A non-rate-limit failure, never retried
/// * `Err(ScrapeError::RetriesExhausted)` - Every attempt was rate limited
pub async fn fetch_with_retry(
    fetcher: &dyn Fetcher,
    url: &str,
    policy: &RetryPolicy,
    jitter: &dyn Jitter,
) -> Result<String, ScrapeError> {
    let max_retries = policy.max_retries.max(1);
    let mut elapsed_backoff = Duration::ZERO;

    for index in 0..max_retries {
        let result = fetcher.visit(url).await;
        let attempt = FetchAttempt {
            index,
            elapsed_backoff,
            status: result.status_code(),
        };

        match result {
            FetchResult::Success { body, .. } => return Ok(body),
            failure if !failure.is_rate_limited() => {
                return Err(ScrapeError::Visit {
                    url: url.to_string(),
                    reason: failure.to_string(),
                });
            }
            _ => {}
        }

        if index + 1 < max_retries {
            let delay = policy.delay(index, jitter);
            tracing::debug!(
                ?attempt,
                ?delay,
                "Rate limited fetching {}, retrying",
                url
            );
            tokio::time::sleep(delay).await;
            elapsed_backoff = elapsed_backoff.saturating_add(delay);
        } else {
            tracing::debug!(?attempt, "Rate limited fetching {}, giving up", url);
        }
    }

    Err(ScrapeError::RetriesExhausted {
        url: url.to_string(),
        attempts: max_retries,
    })
}
