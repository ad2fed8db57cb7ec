//! Background refresh loop tests: full worker and supervisor against mock
//! upstreams, reading through the published snapshot like the display
//! consumer does.

use std::sync::Arc;
use std::time::{Duration, Instant};

use scorewatch::config::Config;
use scorewatch::data_fetcher::api::http_client::create_http_client_with_timeout;
use scorewatch::refresh::{RefreshHandle, RefreshSettings, SharedState, Supervisor};
use scorewatch::{
    CircuitBreakerConfig, CircuitBreakerRegistry, FetcherSet, League, ResultCache, RetryPolicy,
    TeamDescriptor,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn nhl_live_body() -> serde_json::Value {
    serde_json::json!({
        "gamesByDate": [{
            "date": "2026-02-08",
            "games": [{
                "id": 2025020500i64,
                "startTimeUTC": "2026-02-09T00:00:00Z",
                "gameState": "LIVE",
                "periodDescriptor": {"number": 2, "periodType": "REG"},
                "clock": {"timeRemaining": "12:34", "inIntermission": false},
                "homeTeam": {"name": {"default": "Boston Bruins"}, "score": 3},
                "awayTeam": {"name": {"default": "Toronto Maple Leafs"}, "score": 1}
            }]
        }]
    })
}

/// Test fixture: one mock server per upstream, a config pointing at them,
/// and the injected state the worker needs.
struct Fixture {
    nhl: MockServer,
    mlb: MockServer,
    config: Config,
    fetchers: Arc<FetcherSet>,
    cache: Arc<ResultCache>,
    breakers: Arc<CircuitBreakerRegistry>,
    policy: RetryPolicy,
}

impl Fixture {
    async fn new(teams: Vec<TeamDescriptor>) -> Self {
        let nhl = MockServer::start().await;
        let mlb = MockServer::start().await;

        let config = Config {
            teams,
            live_interval_seconds: 1,
            idle_interval_seconds: 1,
            nhl_base_url: nhl.uri(),
            mlb_base_url: mlb.uri(),
            espn_base_url: nhl.uri(),
            nba_base_url: nhl.uri(),
            ..Config::default()
        };

        let client = create_http_client_with_timeout(5).unwrap();
        let fetchers = Arc::new(FetcherSet::new(client, &config));
        let cache = Arc::new(ResultCache::new(16));
        let breakers = Arc::new(CircuitBreakerRegistry::new(CircuitBreakerConfig {
            failure_threshold: 100,
            success_threshold: 1,
            recovery_timeout: Duration::from_secs(60),
        }));
        let policy = RetryPolicy {
            max_attempts: 2,
            initial_delay: Duration::from_millis(1),
            multiplier: 2.0,
            max_delay: Duration::from_millis(5),
            jitter_fraction: 0.2,
            max_stale_age: Duration::from_secs(900),
        };

        Self {
            nhl,
            mlb,
            config,
            fetchers,
            cache,
            breakers,
            policy,
        }
    }

    fn settings(&self) -> RefreshSettings {
        RefreshSettings::from_config(&self.config)
    }

    fn spawn_worker(&self, shared: Arc<SharedState>) -> RefreshHandle {
        RefreshHandle::spawn(
            self.settings(),
            self.fetchers.clone(),
            self.cache.clone(),
            self.breakers.clone(),
            self.policy,
            shared,
        )
    }
}

/// Polls the shared slot until a snapshot with entries appears
async fn wait_for_snapshot(shared: &SharedState, deadline: Duration) -> scorewatch::Snapshot {
    let started = Instant::now();
    loop {
        let snapshot = shared.snapshot().await;
        if !snapshot.is_empty() {
            return snapshot;
        }
        assert!(
            started.elapsed() < deadline,
            "no snapshot published within {deadline:?}"
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test]
async fn test_one_failing_team_does_not_poison_the_cycle() {
    let fixture = Fixture::new(vec![
        TeamDescriptor::new("Boston Bruins", League::Nhl),
        TeamDescriptor::new("Boston Red Sox", League::Mlb),
    ])
    .await;

    Mock::given(method("GET"))
        .and(path("/v1/scoreboard/now"))
        .respond_with(ResponseTemplate::new(200).set_body_json(nhl_live_body()))
        .mount(&fixture.nhl)
        .await;
    // MLB upstream is hard down: connection-level failures for every call
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&fixture.mlb)
        .await;

    let shared = Arc::new(SharedState::new(false));
    let handle = fixture.spawn_worker(shared.clone());

    let snapshot = wait_for_snapshot(&shared, Duration::from_secs(5)).await;

    assert_eq!(snapshot.teams_with_data, vec![true, false]);
    assert_eq!(snapshot.teams_currently_playing, vec![true, false]);
    assert_eq!(snapshot.team_info.len(), 2);
    assert_eq!(snapshot.team_info[0].base.home_score, "3");
    assert_eq!(snapshot.team_info[1].base.bottom_info, "No data");
    assert!(!handle.is_finished(), "the loop must survive a failing team");

    assert!(handle.shutdown(Duration::from_secs(5)).await);
}

#[tokio::test]
async fn test_snapshot_lists_always_equal_length() {
    let fixture = Fixture::new(vec![
        TeamDescriptor::new("Boston Bruins", League::Nhl),
        TeamDescriptor::new("Boston Red Sox", League::Mlb),
        TeamDescriptor::new("Boston Celtics", League::Nba),
    ])
    .await;

    // Everything answers the NHL shape; the NBA fetcher will treat it as an
    // unexpected structure and that team degrades to not-fetched
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(nhl_live_body()))
        .mount(&fixture.nhl)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&fixture.mlb)
        .await;

    let shared = Arc::new(SharedState::new(false));
    let handle = fixture.spawn_worker(shared.clone());

    for _ in 0..10 {
        let (with_data, info, playing) = shared.display_data().await;
        assert_eq!(with_data.len(), info.len());
        assert_eq!(playing.len(), info.len());
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    let snapshot = wait_for_snapshot(&shared, Duration::from_secs(5)).await;
    assert_eq!(snapshot.team_info.len(), 3);
    assert!(handle.shutdown(Duration::from_secs(5)).await);
}

#[tokio::test]
async fn test_worker_stops_within_one_cycle_of_stop_signal() {
    let fixture = Fixture::new(vec![TeamDescriptor::new("Boston Bruins", League::Nhl)]).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(nhl_live_body()))
        .mount(&fixture.nhl)
        .await;

    let shared = Arc::new(SharedState::new(false));
    let handle = fixture.spawn_worker(shared.clone());
    wait_for_snapshot(&shared, Duration::from_secs(5)).await;

    let stop_started = Instant::now();
    let clean = handle.shutdown(Duration::from_secs(5)).await;
    assert!(clean, "worker should stop promptly after the flag flips");
    // One live cycle is 1s; the sleep is interrupted by the notify
    assert!(stop_started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_delay_mode_masks_then_releases_in_order() {
    let fixture = Fixture::new(vec![TeamDescriptor::new("Boston Bruins", League::Nhl)]).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(nhl_live_body()))
        .mount(&fixture.nhl)
        .await;

    let mut config = fixture.config.clone();
    config.delay_enabled = true;
    config.delay_seconds = 2;
    let settings = RefreshSettings::from_config(&config);

    let shared = Arc::new(SharedState::new(true));
    let activated = Instant::now();
    let handle = RefreshHandle::spawn(
        settings,
        fixture.fetchers.clone(),
        fixture.cache.clone(),
        fixture.breakers.clone(),
        fixture.policy,
        shared.clone(),
    );

    // First published snapshot: live data masked behind the placeholder
    let first = wait_for_snapshot(&shared, Duration::from_secs(5)).await;
    assert_eq!(
        first.team_info[0].base.bottom_info,
        "Game started, delay pending"
    );
    assert_eq!(first.team_info[0].base.home_score, "");
    assert!(
        first.teams_currently_playing[0],
        "masking must not hide that the team is playing"
    );

    // Eventually the held snapshots release, no earlier than the delay
    let released = loop {
        let snapshot = shared.snapshot().await;
        if !snapshot.is_empty()
            && snapshot.team_info[0].base.bottom_info != "Game started, delay pending"
        {
            break snapshot;
        }
        assert!(
            activated.elapsed() < Duration::from_secs(10),
            "delay never released"
        );
        tokio::time::sleep(Duration::from_millis(50)).await;
    };

    assert!(
        activated.elapsed() >= Duration::from_secs(2),
        "released after {:?}, before the configured delay",
        activated.elapsed()
    );
    assert_eq!(released.team_info[0].base.home_score, "3");

    assert!(handle.shutdown(Duration::from_secs(5)).await);
}

#[tokio::test]
async fn test_runtime_delay_toggle_is_observed_next_cycle() {
    let fixture = Fixture::new(vec![TeamDescriptor::new("Boston Bruins", League::Nhl)]).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(nhl_live_body()))
        .mount(&fixture.nhl)
        .await;

    let mut config = fixture.config.clone();
    config.delay_seconds = 3600;
    let settings = RefreshSettings::from_config(&config);

    // Delay on at spawn: everything is masked
    let shared = Arc::new(SharedState::new(true));
    let handle = RefreshHandle::spawn(
        settings,
        fixture.fetchers.clone(),
        fixture.cache.clone(),
        fixture.breakers.clone(),
        fixture.policy,
        shared.clone(),
    );
    let first = wait_for_snapshot(&shared, Duration::from_secs(5)).await;
    assert_eq!(
        first.team_info[0].base.bottom_info,
        "Game started, delay pending"
    );

    // User flips delay off: next cycle publishes live data
    shared.set_delay_enabled(false);
    let deadline = Instant::now();
    loop {
        let snapshot = shared.snapshot().await;
        if !snapshot.is_empty() && snapshot.team_info[0].base.home_score == "3" {
            break;
        }
        assert!(
            deadline.elapsed() < Duration::from_secs(5),
            "delay toggle never took effect"
        );
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    assert!(handle.shutdown(Duration::from_secs(5)).await);
}

#[tokio::test]
async fn test_supervisor_restarts_stalled_worker() {
    let fixture = Fixture::new(vec![TeamDescriptor::new("Boston Bruins", League::Nhl)]).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(nhl_live_body()))
        .mount(&fixture.nhl)
        .await;

    // Long idle sleep ensures the heartbeat goes stale between cycles, so
    // the supervisor's tiny stall threshold fires and forces a restart
    let mut config = fixture.config.clone();
    config.live_interval_seconds = 3600;
    config.idle_interval_seconds = 3600;
    let settings = RefreshSettings::from_config(&config);

    let shared = Arc::new(SharedState::new(false));
    let supervisor = Supervisor::new(
        settings,
        fixture.fetchers.clone(),
        fixture.cache.clone(),
        fixture.breakers.clone(),
        fixture.policy,
        shared.clone(),
    )
    .with_timing(Duration::from_millis(300), Duration::from_millis(100))
    .spawn();

    wait_for_snapshot(&shared, Duration::from_secs(5)).await;
    let after_first_cycle = fixture.nhl.received_requests().await.unwrap().len();
    assert!(after_first_cycle >= 1);

    // Wait past the stall threshold: the supervisor should have respawned
    // the worker, which immediately runs another cycle
    let deadline = Instant::now();
    loop {
        let requests = fixture.nhl.received_requests().await.unwrap().len();
        if requests > after_first_cycle {
            break;
        }
        assert!(
            deadline.elapsed() < Duration::from_secs(10),
            "supervisor never restarted the stalled worker"
        );
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    shared.request_stop();
    assert!(
        tokio::time::timeout(Duration::from_secs(15), supervisor)
            .await
            .is_ok(),
        "supervisor should exit after stop"
    );
}

#[tokio::test]
async fn test_cached_result_bridges_upstream_outage_across_cycles() {
    let fixture = Fixture::new(vec![TeamDescriptor::new("Boston Bruins", League::Nhl)]).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(nhl_live_body()))
        .mount(&fixture.nhl)
        .await;

    let shared = Arc::new(SharedState::new(false));
    let handle = fixture.spawn_worker(shared.clone());

    let snapshot = wait_for_snapshot(&shared, Duration::from_secs(5)).await;
    assert_eq!(snapshot.teams_with_data, vec![true]);

    // Upstream goes down; the next cycles substitute the cached result, so
    // the display keeps showing data instead of flipping to "No data"
    fixture.nhl.reset().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&fixture.nhl)
        .await;

    tokio::time::sleep(Duration::from_millis(1500)).await;
    let snapshot = shared.snapshot().await;
    assert_eq!(snapshot.teams_with_data, vec![true]);
    assert_eq!(snapshot.team_info[0].base.home_score, "3");

    assert!(handle.shutdown(Duration::from_secs(5)).await);
}
