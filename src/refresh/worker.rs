//! Background refresh loop and the published snapshot slot
//!
//! One dedicated task fetches every configured team sequentially each
//! cycle, routes the result through the delay buffer, and replaces the
//! shared snapshot wholesale under a single lock. Readers copy the
//! snapshot out and never observe a partially replaced one.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Notify, RwLock};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::delay::DelayBuffer;
use super::interval::calculate_refresh_interval;
use crate::config::Config;
use crate::data_fetcher::api::FetcherSet;
use crate::data_fetcher::models::{ScoreboardData, Snapshot, TeamDescriptor};
use crate::reliability::{CircuitBreakerRegistry, ResultCache, RetryPolicy};

/// Worker settings, frozen at spawn time
#[derive(Debug, Clone)]
pub struct RefreshSettings {
    pub teams: Vec<TeamDescriptor>,
    pub live_interval: Duration,
    pub idle_interval: Duration,
    pub delay_duration: Duration,
}

impl RefreshSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            teams: config.teams.clone(),
            live_interval: Duration::from_secs(config.live_interval_seconds),
            idle_interval: Duration::from_secs(config.idle_interval_seconds),
            delay_duration: Duration::from_secs(config.delay_seconds),
        }
    }
}

/// State shared between the worker, its supervisor and the display
/// consumer. The snapshot is the only hand-off point; the rest is control
/// plumbing (stop signal, delay toggle, heartbeat).
pub struct SharedState {
    snapshot: RwLock<Snapshot>,
    heartbeat: RwLock<Instant>,
    stop: AtomicBool,
    stop_notify: Notify,
    delay_enabled: AtomicBool,
}

impl SharedState {
    pub fn new(delay_enabled: bool) -> Self {
        Self {
            snapshot: RwLock::new(Snapshot::empty()),
            heartbeat: RwLock::new(Instant::now()),
            stop: AtomicBool::new(false),
            stop_notify: Notify::new(),
            delay_enabled: AtomicBool::new(delay_enabled),
        }
    }

    /// Copy of the published parallel lists, in team configuration order.
    /// This is the display consumer's read interface.
    pub async fn display_data(&self) -> (Vec<bool>, Vec<ScoreboardData>, Vec<bool>) {
        let snapshot = self.snapshot.read().await;
        (
            snapshot.teams_with_data.clone(),
            snapshot.team_info.clone(),
            snapshot.teams_currently_playing.clone(),
        )
    }

    /// Copy of the whole published snapshot
    pub async fn snapshot(&self) -> Snapshot {
        self.snapshot.read().await.clone()
    }

    /// Age of the worker's last completed cycle
    pub async fn heartbeat_age(&self) -> Duration {
        self.heartbeat.read().await.elapsed()
    }

    /// Flips the delay toggle; observed by the worker on its next cycle
    pub fn set_delay_enabled(&self, enabled: bool) {
        self.delay_enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn delay_enabled(&self) -> bool {
        self.delay_enabled.load(Ordering::SeqCst)
    }

    /// Requests a prompt worker stop; the worker exits at the next cycle
    /// boundary or sleep wake-up, whichever comes first
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
        self.stop_notify.notify_waiters();
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Completes once a stop has been requested. Registers with the notify
    /// before re-checking the flag so a concurrent `request_stop` cannot
    /// slip between the check and the wait.
    pub async fn wait_for_stop(&self) {
        let mut notified = std::pin::pin!(self.stop_notify.notified());
        notified.as_mut().enable();
        if self.stop_requested() {
            return;
        }
        notified.await;
    }

    async fn publish(&self, snapshot: Snapshot) {
        *self.snapshot.write().await = snapshot;
        *self.heartbeat.write().await = Instant::now();
    }
}

pub struct RefreshWorker {
    settings: RefreshSettings,
    fetchers: Arc<FetcherSet>,
    cache: Arc<ResultCache>,
    breakers: Arc<CircuitBreakerRegistry>,
    policy: RetryPolicy,
    shared: Arc<SharedState>,
    delay_buffer: DelayBuffer,
}

impl RefreshWorker {
    pub fn new(
        settings: RefreshSettings,
        fetchers: Arc<FetcherSet>,
        cache: Arc<ResultCache>,
        breakers: Arc<CircuitBreakerRegistry>,
        policy: RetryPolicy,
        shared: Arc<SharedState>,
    ) -> Self {
        let delay_buffer = DelayBuffer::new(settings.delay_duration);
        Self {
            settings,
            fetchers,
            cache,
            breakers,
            policy,
            shared,
            delay_buffer,
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        info!(
            teams = self.settings.teams.len(),
            live_interval_s = self.settings.live_interval.as_secs(),
            idle_interval_s = self.settings.idle_interval.as_secs(),
            "Refresh worker starting"
        );

        loop {
            if self.shared.stop_requested() {
                break;
            }

            self.run_cycle().await;

            let interval = {
                let snapshot = self.shared.snapshot.read().await;
                calculate_refresh_interval(
                    &snapshot,
                    self.settings.live_interval,
                    self.settings.idle_interval,
                )
            };

            tokio::select! {
                _ = self.shared.wait_for_stop() => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }

        info!("Refresh worker stopped");
    }

    /// One fetch cycle: every team sequentially, failures substituted, the
    /// result routed through the delay buffer and published atomically.
    async fn run_cycle(&mut self) {
        let mut results = Vec::with_capacity(self.settings.teams.len());

        for team in &self.settings.teams {
            if self.shared.stop_requested() {
                return;
            }
            let fetcher = self.fetchers.for_league(team.league);
            let breaker = self.breakers.for_endpoint(fetcher.name());
            match self
                .policy
                .fetch_with_fallback(fetcher.as_ref(), team, &self.cache, Some(breaker.as_ref()))
                .await
            {
                Ok(data) => results.push(data),
                Err(err) => {
                    // One bad team never aborts the cycle
                    error!(team = %team, error = %err, "Team fetch failed, publishing empty entry");
                    results.push(ScoreboardData::not_fetched(team));
                }
            }
        }

        let live = Snapshot::from_results(results);
        let delay_wanted = self.shared.delay_enabled() && live.any_playing();
        let published = self.delay_buffer.process(live, delay_wanted);
        self.shared.publish(published).await;
    }
}

/// Owning handle for a spawned worker: the shared state plus the task
pub struct RefreshHandle {
    shared: Arc<SharedState>,
    task: JoinHandle<()>,
}

impl RefreshHandle {
    pub fn spawn(
        settings: RefreshSettings,
        fetchers: Arc<FetcherSet>,
        cache: Arc<ResultCache>,
        breakers: Arc<CircuitBreakerRegistry>,
        policy: RetryPolicy,
        shared: Arc<SharedState>,
    ) -> Self {
        let worker = RefreshWorker::new(settings, fetchers, cache, breakers, policy, shared.clone());
        Self {
            shared,
            task: worker.spawn(),
        }
    }

    pub fn shared(&self) -> Arc<SharedState> {
        self.shared.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Aborts the task outright; used by the supervisor on a stalled worker
    pub fn abort(&self) {
        self.task.abort();
    }

    /// Signals the worker to stop and waits up to `timeout` for it to exit.
    /// Returns `true` on a clean join; on timeout the task is aborted.
    pub async fn shutdown(mut self, timeout: Duration) -> bool {
        self.shared.request_stop();
        match tokio::time::timeout(timeout, &mut self.task).await {
            Ok(_) => true,
            Err(_) => {
                warn!("Refresh worker did not stop within {:?}, aborting", timeout);
                self.task.abort();
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_fetcher::models::League;

    fn sample_snapshot() -> Snapshot {
        let mut entry =
            ScoreboardData::not_fetched(&TeamDescriptor::new("Boston Bruins", League::Nhl));
        entry.has_data = true;
        entry.currently_playing = true;
        Snapshot::from_results(vec![entry])
    }

    #[tokio::test]
    async fn test_shared_state_publish_and_read() {
        let shared = SharedState::new(false);
        assert!(shared.snapshot().await.is_empty());

        shared.publish(sample_snapshot()).await;

        let (with_data, info, playing) = shared.display_data().await;
        assert_eq!(with_data, vec![true]);
        assert_eq!(playing, vec![true]);
        assert_eq!(info.len(), 1);
        assert_eq!(info[0].base.home_team, "Boston Bruins");
    }

    #[tokio::test]
    async fn test_display_data_is_a_copy() {
        let shared = SharedState::new(false);
        shared.publish(sample_snapshot()).await;

        let (_, mut info, _) = shared.display_data().await;
        info[0].base.home_team = "Mutated".to_string();

        let (_, fresh, _) = shared.display_data().await;
        assert_eq!(fresh[0].base.home_team, "Boston Bruins");
    }

    #[tokio::test]
    async fn test_heartbeat_advances_on_publish() {
        let shared = SharedState::new(false);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(shared.heartbeat_age().await >= Duration::from_millis(15));

        shared.publish(sample_snapshot()).await;
        assert!(shared.heartbeat_age().await < Duration::from_millis(15));
    }

    #[tokio::test]
    async fn test_stop_flag_and_delay_toggle() {
        let shared = SharedState::new(true);
        assert!(shared.delay_enabled());
        shared.set_delay_enabled(false);
        assert!(!shared.delay_enabled());

        assert!(!shared.stop_requested());
        shared.request_stop();
        assert!(shared.stop_requested());
    }
}
