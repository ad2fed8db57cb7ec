//! Application-wide constants and configuration values
//!
//! This module centralizes all magic numbers and configuration constants
//! to improve maintainability and make the codebase more configurable.

#![allow(dead_code)]

/// Default timeout for HTTP requests in seconds
pub const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 30;

/// Maximum number of connections per host in the HTTP client pool
pub const HTTP_POOL_MAX_IDLE_PER_HOST: usize = 100;

/// Cache TTL (Time To Live) values in seconds
pub mod cache_ttl {
    /// TTL for results fetched while the game is live. Kept shorter than the
    /// live refresh interval so a fallback read never masks a newer score.
    pub const LIVE_RESULT_SECONDS: u64 = 30;

    /// TTL for results of finished or not-yet-started games (10 minutes)
    pub const IDLE_RESULT_SECONDS: u64 = 600;

    /// Upper bound on how stale a cached result may be when substituted for
    /// a failed fetch (15 minutes)
    pub const MAX_STALE_FALLBACK_SECONDS: u64 = 900;
}

/// Retry configuration
pub mod retry {
    /// Maximum number of attempts for one retry-wrapped API call
    pub const MAX_ATTEMPTS: u32 = 3;

    /// Base delay for exponential backoff (milliseconds)
    pub const INITIAL_DELAY_MS: u64 = 500;

    /// Backoff multiplier applied per attempt
    pub const MULTIPLIER: f64 = 2.0;

    /// Maximum delay between retries (seconds)
    pub const MAX_DELAY_SECONDS: u64 = 30;

    /// Jitter range applied to each backoff sleep (+/- percentage).
    /// Use 20% to avoid thundering herd across clients.
    pub const JITTER_FRACTION: f64 = 0.2;
}

/// Circuit breaker tuning
pub mod circuit {
    /// Consecutive failures before an endpoint's breaker opens
    pub const FAILURE_THRESHOLD: u32 = 5;

    /// Consecutive half-open successes before the breaker closes again
    pub const SUCCESS_THRESHOLD: u32 = 2;

    /// Cool-down before an open breaker admits a trial call (seconds)
    pub const RECOVERY_TIMEOUT_SECONDS: u64 = 60;
}

/// Background refresh cadence in seconds
pub mod refresh {
    /// Interval between fetch cycles while any configured team is playing
    pub const LIVE_INTERVAL_SECONDS: u64 = 10;

    /// Interval between fetch cycles when no team is playing
    pub const IDLE_INTERVAL_SECONDS: u64 = 180;

    /// Heartbeat age after which the supervisor considers the worker stuck.
    /// Must exceed one full idle cycle plus the worst-case retry budget.
    pub const HEARTBEAT_STALL_SECONDS: u64 = 420;

    /// How often the supervisor inspects the worker heartbeat
    pub const SUPERVISOR_POLL_SECONDS: u64 = 15;

    /// Bound on waiting for the worker to exit after the stop signal
    pub const SHUTDOWN_JOIN_TIMEOUT_SECONDS: u64 = 10;
}

/// Broadcast-delay buffering defaults
pub mod delay {
    /// Default live delay when the user enables delay mode (seconds)
    pub const DEFAULT_DELAY_SECONDS: u64 = 45;

    /// Status line shown while snapshots are held back
    pub const PENDING_MESSAGE: &str = "Game started, delay pending";
}

/// Environment variable names
pub mod env_vars {
    /// Environment variable for overriding the ESPN API base URL
    pub const ESPN_BASE_URL: &str = "SCOREWATCH_ESPN_BASE_URL";

    /// Environment variable for overriding the MLB StatsAPI base URL
    pub const MLB_BASE_URL: &str = "SCOREWATCH_MLB_BASE_URL";

    /// Environment variable for overriding the NHL API base URL
    pub const NHL_BASE_URL: &str = "SCOREWATCH_NHL_BASE_URL";

    /// Environment variable for overriding the NBA API base URL
    pub const NBA_BASE_URL: &str = "SCOREWATCH_NBA_BASE_URL";

    /// Environment variable for log file path override
    pub const LOG_FILE: &str = "SCOREWATCH_LOG_FILE";

    /// Environment variable for HTTP timeout override in seconds
    pub const HTTP_TIMEOUT: &str = "SCOREWATCH_HTTP_TIMEOUT";
}

/// Capacity of the result cache (entries). One entry per team is the steady
/// state; headroom covers team-list edits at runtime.
pub const RESULT_CACHE_CAPACITY: usize = 64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_constants_are_reasonable() {
        let live = cache_ttl::LIVE_RESULT_SECONDS;
        let idle = cache_ttl::IDLE_RESULT_SECONDS;
        let stale = cache_ttl::MAX_STALE_FALLBACK_SECONDS;

        // Live results must expire faster than idle ones
        assert!(live < idle);
        // The stale-fallback bound should be the most permissive
        assert!(stale >= idle);
        // Live TTL should outlast at least one live refresh interval so a
        // fallback read can bridge a single failed cycle
        assert!(live >= refresh::LIVE_INTERVAL_SECONDS);
    }

    #[test]
    fn test_retry_constants_are_reasonable() {
        assert!(retry::MAX_ATTEMPTS > 0);
        assert!(retry::INITIAL_DELAY_MS > 0);
        assert!(retry::MULTIPLIER > 1.0);
        assert!(retry::MAX_DELAY_SECONDS > 0);
        assert!(retry::JITTER_FRACTION > 0.0 && retry::JITTER_FRACTION < 1.0);

        // The cap must dominate the base delay or backoff is pointless
        assert!(retry::MAX_DELAY_SECONDS * 1000 > retry::INITIAL_DELAY_MS);
    }

    #[test]
    fn test_circuit_constants_are_reasonable() {
        assert!(circuit::FAILURE_THRESHOLD > 0);
        assert!(circuit::SUCCESS_THRESHOLD > 0);
        assert!(circuit::RECOVERY_TIMEOUT_SECONDS > 0);

        // Opening should take more evidence than closing
        assert!(circuit::FAILURE_THRESHOLD >= circuit::SUCCESS_THRESHOLD);
    }

    #[test]
    fn test_refresh_constants_are_reasonable() {
        assert!(refresh::LIVE_INTERVAL_SECONDS < refresh::IDLE_INTERVAL_SECONDS);
        // The stall threshold has to tolerate a full idle sleep
        assert!(refresh::HEARTBEAT_STALL_SECONDS > refresh::IDLE_INTERVAL_SECONDS);
        assert!(refresh::SUPERVISOR_POLL_SECONDS < refresh::HEARTBEAT_STALL_SECONDS);
        assert!(refresh::SHUTDOWN_JOIN_TIMEOUT_SECONDS > 0);
    }

    #[test]
    fn test_env_var_names_are_not_empty() {
        assert!(!env_vars::ESPN_BASE_URL.is_empty());
        assert!(!env_vars::MLB_BASE_URL.is_empty());
        assert!(!env_vars::NHL_BASE_URL.is_empty());
        assert!(!env_vars::NBA_BASE_URL.is_empty());
        assert!(!env_vars::LOG_FILE.is_empty());
        assert!(!env_vars::HTTP_TIMEOUT.is_empty());
    }
}
