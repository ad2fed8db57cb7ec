// src/main.rs
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use scorewatch::cli::{parse_team_arg, Args};
use scorewatch::config::Config;
use scorewatch::constants::{refresh, RESULT_CACHE_CAPACITY};
use scorewatch::data_fetcher::api::http_client::create_http_client_with_timeout;
use scorewatch::data_fetcher::models::{GamePhase, ScoreboardData, Snapshot};
use scorewatch::error::AppError;
use scorewatch::logging::setup_logging;
use scorewatch::refresh::{RefreshSettings, SharedState, Supervisor};
use scorewatch::reliability::{
    CircuitBreakerConfig, CircuitBreakerRegistry, ResultCache, RetryPolicy,
};
use scorewatch::FetcherSet;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let args = Args::parse();

    let (log_file_path, _guard) = setup_logging(&args).await?;
    info!("Logging to {log_file_path}");

    if args.list_config {
        Config::display().await?;
        return Ok(());
    }

    let mut config = Config::load().await?;
    apply_cli_overrides(&mut config, &args)?;
    config.validate()?;

    if args.save_config {
        config.save().await?;
        println!("Configuration saved to {}", Config::get_config_path());
        return Ok(());
    }

    // Injected state: one HTTP client, one cache, one breaker registry,
    // shared by every fetch for the lifetime of the process
    let client = create_http_client_with_timeout(config.http_timeout_seconds)?;
    let fetchers = Arc::new(FetcherSet::new(client, &config));
    let cache = Arc::new(ResultCache::new(RESULT_CACHE_CAPACITY));
    let breakers = Arc::new(CircuitBreakerRegistry::new(CircuitBreakerConfig::default()));
    let policy = RetryPolicy::default();

    if args.once || args.debug {
        return run_once(&config, &fetchers, &cache, &breakers, policy).await;
    }

    run_scoreboard(config, fetchers, cache, breakers, policy).await
}

/// Folds command-line overrides into the loaded configuration
fn apply_cli_overrides(config: &mut Config, args: &Args) -> Result<(), AppError> {
    if !args.teams.is_empty() {
        config.teams = args
            .teams
            .iter()
            .map(|raw| parse_team_arg(raw))
            .collect::<Result<Vec<_>, _>>()?;
    }
    if args.delay {
        config.delay_enabled = true;
    }
    if args.no_delay {
        config.delay_enabled = false;
    }
    if let Some(delay_seconds) = args.delay_seconds {
        config.delay_enabled = true;
        config.delay_seconds = delay_seconds;
    }
    if let Some(live_interval) = args.live_interval {
        config.live_interval_seconds = live_interval;
    }
    if let Some(idle_interval) = args.idle_interval {
        config.idle_interval_seconds = idle_interval;
    }
    if let Some(log_file) = &args.log_file {
        config.log_file_path = Some(log_file.clone());
    }
    Ok(())
}

/// Single fetch cycle: every configured team once, straight to stdout
async fn run_once(
    config: &Config,
    fetchers: &FetcherSet,
    cache: &ResultCache,
    breakers: &CircuitBreakerRegistry,
    policy: RetryPolicy,
) -> Result<(), AppError> {
    let mut results = Vec::with_capacity(config.teams.len());
    for team in &config.teams {
        let fetcher = fetchers.for_league(team.league);
        let breaker = breakers.for_endpoint(fetcher.name());
        match policy
            .fetch_with_fallback(fetcher.as_ref(), team, cache, Some(breaker.as_ref()))
            .await
        {
            Ok(data) => results.push(data),
            Err(err) => {
                eprintln!("{team}: {err}");
                results.push(ScoreboardData::not_fetched(team));
            }
        }
    }

    print_snapshot(&Snapshot::from_results(results));
    Ok(())
}

/// Continuous mode: background refresh under supervision, stdout consumer
/// reading the published snapshot at its own cadence
async fn run_scoreboard(
    config: Config,
    fetchers: Arc<FetcherSet>,
    cache: Arc<ResultCache>,
    breakers: Arc<CircuitBreakerRegistry>,
    policy: RetryPolicy,
) -> Result<(), AppError> {
    let shared = Arc::new(SharedState::new(config.delay_enabled));
    let supervisor = Supervisor::new(
        RefreshSettings::from_config(&config),
        fetchers,
        cache,
        breakers,
        policy,
        shared.clone(),
    )
    .spawn();

    println!(
        "Following {} team(s); refresh {}s live / {}s idle. Ctrl-C to quit.",
        config.teams.len(),
        config.live_interval_seconds,
        config.idle_interval_seconds
    );

    let mut last_printed = None;
    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal?;
                info!("Interrupt received, shutting down");
                shared.request_stop();
                break;
            }
            _ = tokio::time::sleep(Duration::from_secs(2)) => {
                let snapshot = shared.snapshot().await;
                if !snapshot.is_empty() && last_printed != Some(snapshot.fetched_at) {
                    last_printed = Some(snapshot.fetched_at);
                    print_snapshot(&snapshot);
                }
            }
        }
    }

    // The supervisor joins the worker with its own bounded timeout
    let joined = tokio::time::timeout(
        Duration::from_secs(refresh::SHUTDOWN_JOIN_TIMEOUT_SECONDS + 2),
        supervisor,
    )
    .await;
    if joined.is_err() {
        eprintln!("Shutdown timed out waiting for the refresh loop");
    }
    Ok(())
}

fn print_snapshot(snapshot: &Snapshot) {
    println!("── {} ──", snapshot.fetched_at.format("%H:%M:%S"));
    for info in &snapshot.team_info {
        println!("{}", format_team_line(info));
    }
}

fn format_team_line(info: &ScoreboardData) -> String {
    if !info.has_data {
        return format!("{:<24} {}", info.base.home_team, info.base.bottom_info);
    }
    match info.base.phase {
        GamePhase::NoGame => format!("{:<24} no game today", info.base.home_team),
        GamePhase::Scheduled | GamePhase::Postponed => {
            let when = match (info.base.phase, info.base.start_time) {
                (GamePhase::Postponed, _) => "postponed".to_string(),
                (_, Some(start)) => start.format("%H:%M UTC").to_string(),
                (_, None) => info.base.top_info.clone(),
            };
            format!(
                "{} @ {}  {}",
                info.base.away_team, info.base.home_team, when
            )
        }
        GamePhase::Live | GamePhase::Final => {
            let mut line = format!(
                "{} {} @ {} {}",
                info.base.away_team, info.base.away_score, info.base.home_team, info.base.home_score
            );
            if info.base.phase == GamePhase::Final {
                line.push_str("  Final");
            } else {
                if !info.base.top_info.is_empty() {
                    line.push_str(&format!("  | {}", info.base.top_info));
                }
                if !info.base.bottom_info.is_empty() {
                    line.push_str(&format!(" | {}", info.base.bottom_info));
                }
            }
            line
        }
    }
}
