//! Refresh cadence selection
//!
//! Two effective cadences: a short interval while any configured team is
//! playing and a long one otherwise. A team whose game should be starting
//! about now also gets the short interval, so the moment a game goes live
//! is not missed by a long idle sleep.

use chrono::Utc;
use std::time::Duration;

use crate::data_fetcher::models::{GamePhase, ScoreboardData, Snapshot};

/// Checks if a game is scheduled to start within the next few minutes or
/// has recently started. The window is deliberately generous to catch games
/// whose upstream status lags the actual start.
fn is_game_near_start_time(info: &ScoreboardData) -> bool {
    if info.base.phase != GamePhase::Scheduled {
        return false;
    }
    let Some(start) = info.base.start_time else {
        return false;
    };

    let time_diff = Utc::now().signed_duration_since(start);
    time_diff >= chrono::Duration::minutes(-5) && time_diff <= chrono::Duration::minutes(10)
}

/// Picks the interval to sleep until the next fetch cycle
pub fn calculate_refresh_interval(
    snapshot: &Snapshot,
    live_interval: Duration,
    idle_interval: Duration,
) -> Duration {
    if snapshot.any_playing() {
        return live_interval;
    }
    if snapshot.team_info.iter().any(is_game_near_start_time) {
        tracing::debug!("Game near start time, keeping the live refresh interval");
        return live_interval;
    }
    idle_interval
}
