//! Worker supervision
//!
//! The supervisor owns the refresh worker's handle, watches its heartbeat
//! and respawns it when it dies or stalls. The display consumer keeps
//! reading the shared snapshot throughout; a restart is invisible apart
//! from a warn-level log line.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::worker::{RefreshHandle, RefreshSettings, SharedState};
use crate::constants::refresh;
use crate::data_fetcher::api::FetcherSet;
use crate::reliability::{CircuitBreakerRegistry, ResultCache, RetryPolicy};

pub struct Supervisor {
    settings: RefreshSettings,
    fetchers: Arc<FetcherSet>,
    cache: Arc<ResultCache>,
    breakers: Arc<CircuitBreakerRegistry>,
    policy: RetryPolicy,
    shared: Arc<SharedState>,
    /// Heartbeat age at which the worker counts as stuck
    stall_after: Duration,
    /// How often the heartbeat is inspected
    poll_interval: Duration,
}

impl Supervisor {
    pub fn new(
        settings: RefreshSettings,
        fetchers: Arc<FetcherSet>,
        cache: Arc<ResultCache>,
        breakers: Arc<CircuitBreakerRegistry>,
        policy: RetryPolicy,
        shared: Arc<SharedState>,
    ) -> Self {
        Self {
            settings,
            fetchers,
            cache,
            breakers,
            policy,
            shared,
            stall_after: Duration::from_secs(refresh::HEARTBEAT_STALL_SECONDS),
            poll_interval: Duration::from_secs(refresh::SUPERVISOR_POLL_SECONDS),
        }
    }

    /// Overrides the stall/poll timing; tests drive this with short values
    pub fn with_timing(mut self, stall_after: Duration, poll_interval: Duration) -> Self {
        self.stall_after = stall_after;
        self.poll_interval = poll_interval;
        self
    }

    /// Spawns the supervisor task, which in turn owns the worker
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    fn spawn_worker(&self) -> RefreshHandle {
        RefreshHandle::spawn(
            self.settings.clone(),
            self.fetchers.clone(),
            self.cache.clone(),
            self.breakers.clone(),
            self.policy,
            self.shared.clone(),
        )
    }

    async fn run(self) {
        info!(
            stall_after_s = self.stall_after.as_secs(),
            "Supervisor starting refresh worker"
        );
        let mut worker = self.spawn_worker();

        loop {
            tokio::select! {
                _ = self.shared.wait_for_stop() => break,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }

            if self.shared.stop_requested() {
                break;
            }

            if worker.is_finished() {
                warn!("Refresh worker died, restarting");
                worker = self.spawn_worker();
                continue;
            }

            let age = self.shared.heartbeat_age().await;
            if age > self.stall_after {
                warn!(
                    heartbeat_age_s = age.as_secs(),
                    "Refresh worker heartbeat stalled, restarting"
                );
                worker.abort();
                worker = self.spawn_worker();
            }
        }

        let clean = worker
            .shutdown(Duration::from_secs(refresh::SHUTDOWN_JOIN_TIMEOUT_SECONDS))
            .await;
        info!(clean_shutdown = clean, "Supervisor stopped");
    }
}
