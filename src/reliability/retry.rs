//! Retry policy with exponential backoff and cache fallback
//!
//! An explicit policy object composed around a `Fetcher`: every upstream
//! call in the refresh loop goes through `fetch_with_fallback`, which owns
//! the attempt budget, the backoff sleeps, the circuit breaker bookkeeping
//! and the stale-data substitution when everything fails.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::cache::ResultCache;
use super::circuit::CircuitBreaker;
use crate::constants::{cache_ttl, retry};
use crate::data_fetcher::api::{fingerprint, Fetcher};
use crate::data_fetcher::models::{ScoreboardData, TeamDescriptor};
use crate::error::AppError;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total invocations of the wrapped call, first attempt included
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
    /// Each backoff sleep is stretched or shrunk by up to this fraction
    pub jitter_fraction: f64,
    /// Oldest cached result that may stand in for a failed call
    pub max_stale_age: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: retry::MAX_ATTEMPTS,
            initial_delay: Duration::from_millis(retry::INITIAL_DELAY_MS),
            multiplier: retry::MULTIPLIER,
            max_delay: Duration::from_secs(retry::MAX_DELAY_SECONDS),
            jitter_fraction: retry::JITTER_FRACTION,
            max_stale_age: Duration::from_secs(cache_ttl::MAX_STALE_FALLBACK_SECONDS),
        }
    }
}

impl RetryPolicy {
    /// Backoff before the attempt after `completed_attempts`, capped and
    /// jittered
    fn backoff_delay(&self, completed_attempts: u32, rng: &mut SmallRng) -> Duration {
        let base_ms = self.initial_delay.as_millis() as f64
            * self.multiplier.powi(completed_attempts as i32);
        let capped_ms = base_ms.min(self.max_delay.as_millis() as f64);
        let jitter = capped_ms * self.jitter_fraction;
        let low = (capped_ms - jitter).max(0.0);
        let high = capped_ms + jitter;
        Duration::from_millis(rng.random_range(low..=high) as u64)
    }

    /// Runs one retry-wrapped fetch for a team.
    ///
    /// Non-recoverable errors abort the budget immediately; recoverable
    /// ones sleep and retry. Successes are written back to the cache under
    /// the call's fingerprint (refreshing the fallback for the next
    /// outage). When the budget is exhausted, or the breaker is open, a
    /// cached result no older than `max_stale_age` is substituted;
    /// otherwise the last error propagates.
    pub async fn fetch_with_fallback(
        &self,
        fetcher: &dyn Fetcher,
        team: &TeamDescriptor,
        cache: &ResultCache,
        breaker: Option<&CircuitBreaker>,
    ) -> Result<ScoreboardData, AppError> {
        let key = fingerprint(fetcher.name(), team);
        let mut rng = SmallRng::from_os_rng();
        let mut last_err: Option<AppError> = None;

        for attempt in 0..self.max_attempts {
            if let Some(breaker) = breaker
                && let Err(err) = breaker.try_acquire()
            {
                // Known-down endpoint: skip the remaining budget entirely
                debug!(endpoint = fetcher.name(), team = %team, "{err}");
                last_err = Some(err);
                break;
            }

            let started = Instant::now();
            match fetcher.fetch(team).await {
                Ok(value) => {
                    if let Some(breaker) = breaker {
                        breaker.record_success();
                    }
                    info!(
                        endpoint = fetcher.name(),
                        team = %team,
                        attempt = attempt + 1,
                        latency_ms = started.elapsed().as_millis() as u64,
                        "Fetch succeeded"
                    );
                    let ttl = if value.currently_playing {
                        Duration::from_secs(cache_ttl::LIVE_RESULT_SECONDS)
                    } else {
                        Duration::from_secs(cache_ttl::IDLE_RESULT_SECONDS)
                    };
                    cache.insert(key, value.clone(), ttl).await;
                    return Ok(value);
                }
                Err(err) => {
                    if let Some(breaker) = breaker {
                        breaker.record_failure();
                    }
                    warn!(
                        endpoint = fetcher.name(),
                        team = %team,
                        attempt = attempt + 1,
                        max_attempts = self.max_attempts,
                        latency_ms = started.elapsed().as_millis() as u64,
                        error = %err,
                        "Fetch attempt failed"
                    );

                    let retryable = err.is_retryable();
                    last_err = Some(err);
                    if !retryable {
                        break;
                    }
                    if attempt + 1 < self.max_attempts {
                        let delay = self.backoff_delay(attempt, &mut rng);
                        debug!(
                            endpoint = fetcher.name(),
                            "Backing off {:?} before retry", delay
                        );
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        let err = match last_err {
            Some(err) => err,
            None => {
                return Err(AppError::config_error(
                    "Retry policy configured with zero attempts",
                ));
            }
        };

        if err.allows_cache_fallback()
            && let Some(cached) = cache.get(&key, Some(self.max_stale_age)).await
        {
            warn!(
                endpoint = fetcher.name(),
                team = %team,
                error = %err,
                "Substituting cached result after failed fetch"
            );
            return Ok(cached);
        }

        Err(err)
    }
}
