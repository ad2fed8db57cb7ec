//! Scorewatch Library
//!
//! Headless live-scoreboard poller: fetches scores for a configured list
//! of teams from public sports APIs (ESPN, MLB StatsAPI, NHL, NBA), runs
//! every call through a retry/backoff policy, a TTL cache and per-endpoint
//! circuit breakers, and publishes one consistent snapshot per cycle for a
//! display consumer to read at its own cadence.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use scorewatch::config::Config;
//! use scorewatch::constants::RESULT_CACHE_CAPACITY;
//! use scorewatch::data_fetcher::api::FetcherSet;
//! use scorewatch::data_fetcher::api::http_client::create_http_client_with_timeout;
//! use scorewatch::error::AppError;
//! use scorewatch::refresh::{RefreshSettings, SharedState, Supervisor};
//! use scorewatch::reliability::{
//!     CircuitBreakerConfig, CircuitBreakerRegistry, ResultCache, RetryPolicy,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), AppError> {
//!     let config = Config::load().await?;
//!     config.validate()?;
//!
//!     let client = create_http_client_with_timeout(config.http_timeout_seconds)?;
//!     let fetchers = Arc::new(FetcherSet::new(client, &config));
//!     let cache = Arc::new(ResultCache::new(RESULT_CACHE_CAPACITY));
//!     let breakers = Arc::new(CircuitBreakerRegistry::new(CircuitBreakerConfig::default()));
//!     let shared = Arc::new(SharedState::new(config.delay_enabled));
//!
//!     let _supervisor = Supervisor::new(
//!         RefreshSettings::from_config(&config),
//!         fetchers,
//!         cache,
//!         breakers,
//!         RetryPolicy::default(),
//!         shared.clone(),
//!     )
//!     .spawn();
//!
//!     let (has_data, info, playing) = shared.display_data().await;
//!     println!("{} teams, {:?} playing", info.len(), playing);
//!     let _ = has_data;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod data_fetcher;
pub mod error;
pub mod logging;
pub mod refresh;
pub mod reliability;

// Re-export commonly used types for convenience
pub use config::Config;
pub use data_fetcher::api::{Fetcher, FetcherSet};
pub use data_fetcher::models::{
    GamePhase, League, ScoreboardData, Snapshot, TeamDescriptor,
};
pub use error::AppError;
pub use refresh::{DelayBuffer, RefreshHandle, RefreshSettings, SharedState, Supervisor};
pub use reliability::{
    CacheStats, CircuitBreaker, CircuitBreakerConfig, CircuitBreakerRegistry, CircuitState,
    ResultCache, RetryPolicy,
};

/// Current version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
