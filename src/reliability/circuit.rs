//! Per-endpoint circuit breakers
//!
//! A breaker stops the refresh loop from burning its whole retry budget on
//! an upstream that is already known to be down: after enough consecutive
//! failures the endpoint fails fast until a cool-down passes, then a few
//! trial calls decide whether it has recovered.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::constants::circuit;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Normal operation, calls pass through
    Closed,
    /// Failure threshold exceeded, calls fail fast until the cool-down ends
    Open,
    /// Cool-down elapsed, trial calls decide between Closed and Open
    HalfOpen,
}

#[derive(Debug, Clone, Copy)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub success_threshold: u32,
    pub recovery_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: circuit::FAILURE_THRESHOLD,
            success_threshold: circuit::SUCCESS_THRESHOLD,
            recovery_timeout: Duration::from_secs(circuit::RECOVERY_TIMEOUT_SECONDS),
        }
    }
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    failure_count: u32,
    success_count: u32,
    last_failure_time: Option<Instant>,
    opened_at: Option<Instant>,
}

pub struct CircuitBreaker {
    endpoint: String,
    config: CircuitBreakerConfig,
    // One mutex per breaker; the refresh worker is the only steady caller
    // but diagnostics may peek from other tasks
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    pub fn new(endpoint: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            endpoint: endpoint.into(),
            config,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                failure_count: 0,
                success_count: 0,
                last_failure_time: None,
                opened_at: None,
            }),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Gate before invoking the wrapped call. While Open and inside the
    /// cool-down this fails fast without touching the endpoint; once the
    /// cool-down has elapsed the breaker moves to HalfOpen and admits the
    /// trial call.
    pub fn try_acquire(&self) -> Result<(), AppError> {
        let mut inner = self.inner.lock().expect("circuit breaker lock poisoned");
        match inner.state {
            CircuitState::Closed | CircuitState::HalfOpen => Ok(()),
            CircuitState::Open => {
                let elapsed = inner
                    .opened_at
                    .map(|at| at.elapsed())
                    .unwrap_or(Duration::ZERO);
                if elapsed >= self.config.recovery_timeout {
                    info!(
                        endpoint = %self.endpoint,
                        "Circuit breaker half-open, admitting trial call"
                    );
                    inner.state = CircuitState::HalfOpen;
                    inner.success_count = 0;
                    Ok(())
                } else {
                    let remaining = self.config.recovery_timeout - elapsed;
                    Err(AppError::circuit_open(
                        self.endpoint.as_str(),
                        remaining.as_secs().max(1),
                    ))
                }
            }
        }
    }

    pub fn record_success(&self) {
        let mut inner = self.inner.lock().expect("circuit breaker lock poisoned");
        match inner.state {
            CircuitState::Closed => {
                inner.failure_count = 0;
            }
            CircuitState::HalfOpen => {
                inner.success_count += 1;
                if inner.success_count >= self.config.success_threshold {
                    info!(endpoint = %self.endpoint, "Circuit breaker closed after recovery");
                    inner.state = CircuitState::Closed;
                    inner.failure_count = 0;
                    inner.success_count = 0;
                    inner.opened_at = None;
                }
            }
            CircuitState::Open => {
                // A success can't be observed while open; try_acquire moves
                // to HalfOpen first. Keep the state untouched.
            }
        }
    }

    pub fn record_failure(&self) {
        let mut inner = self.inner.lock().expect("circuit breaker lock poisoned");
        inner.last_failure_time = Some(Instant::now());
        match inner.state {
            CircuitState::Closed => {
                inner.failure_count += 1;
                if inner.failure_count >= self.config.failure_threshold {
                    warn!(
                        endpoint = %self.endpoint,
                        failures = inner.failure_count,
                        "Circuit breaker opened"
                    );
                    inner.state = CircuitState::Open;
                    inner.opened_at = Some(Instant::now());
                }
            }
            CircuitState::HalfOpen => {
                warn!(
                    endpoint = %self.endpoint,
                    "Trial call failed, circuit breaker reopened"
                );
                inner.state = CircuitState::Open;
                inner.opened_at = Some(Instant::now());
                inner.success_count = 0;
            }
            CircuitState::Open => {}
        }
    }

    pub fn state(&self) -> CircuitState {
        self.inner
            .lock()
            .expect("circuit breaker lock poisoned")
            .state
    }

    pub fn failure_count(&self) -> u32 {
        self.inner
            .lock()
            .expect("circuit breaker lock poisoned")
            .failure_count
    }

    pub fn last_failure_time(&self) -> Option<Instant> {
        self.inner
            .lock()
            .expect("circuit breaker lock poisoned")
            .last_failure_time
    }
}

/// Injected registry of per-endpoint breakers; created once at startup and
/// shared with the refresh worker.
pub struct CircuitBreakerRegistry {
    config: CircuitBreakerConfig,
    breakers: Mutex<HashMap<String, Arc<CircuitBreaker>>>,
}

impl CircuitBreakerRegistry {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            breakers: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the breaker for an endpoint, creating it on first use
    pub fn for_endpoint(&self, endpoint: &str) -> Arc<CircuitBreaker> {
        let mut breakers = self
            .breakers
            .lock()
            .expect("circuit breaker registry lock poisoned");
        breakers
            .entry(endpoint.to_string())
            .or_insert_with(|| Arc::new(CircuitBreaker::new(endpoint, self.config)))
            .clone()
    }

    pub fn endpoints(&self) -> Vec<String> {
        let breakers = self
            .breakers
            .lock()
            .expect("circuit breaker registry lock poisoned");
        breakers.keys().cloned().collect()
    }
}
