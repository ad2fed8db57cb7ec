pub mod espn;
pub mod fetch_utils;
pub mod http_client;
pub mod mlb;
pub mod nba;
pub mod nhl;
pub mod urls;

use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;

use crate::config::Config;
use crate::data_fetcher::models::{League, ScoreboardData, TeamDescriptor};
use crate::error::AppError;

pub use espn::EspnFetcher;
pub use mlb::MlbFetcher;
pub use nba::NbaFetcher;
pub use nhl::NhlFetcher;
// Re-export URL utilities
pub use urls::*;

/// One upstream API call, normalized for one team.
///
/// Implementations must be side-effect-free beyond the network call and
/// safe to call repeatedly; each call reflects current game state. Failures
/// surface as typed `AppError`s so the retry policy can tell recoverable
/// kinds from permanent ones.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch and normalize current scoreboard data for one team
    async fn fetch(&self, team: &TeamDescriptor) -> Result<ScoreboardData, AppError>;

    /// Endpoint name used in logs, cache fingerprints and breaker keys
    fn name(&self) -> &str;
}

/// Deterministic cache key for one (fetcher, team) call
pub fn fingerprint(fetcher_name: &str, team: &TeamDescriptor) -> String {
    format!(
        "{fetcher_name}:{}:{}",
        team.league.code(),
        team.display_name.to_lowercase().replace(' ', "_")
    )
}

/// Case-insensitive match between a team name from an upstream payload and
/// the configured display name. Upstreams disagree on whether they send
/// "Boston Bruins", "Bruins" or "Boston", so containment runs both ways.
pub(crate) fn team_matches(candidate: &str, wanted: &str) -> bool {
    if candidate.is_empty() || wanted.is_empty() {
        return false;
    }
    let candidate = candidate.to_lowercase();
    let wanted = wanted.to_lowercase();
    candidate == wanted || candidate.contains(&wanted) || wanted.contains(&candidate)
}

/// Ordinal suffix for innings, periods and quarters ("1st", "2nd", ...)
pub(crate) fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (1, 11) | (2, 12) | (3, 13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

/// The per-league fetcher instances, built once at startup from config and
/// shared with the refresh worker. Explicit injected state instead of a
/// process-wide registry.
pub struct FetcherSet {
    espn: Arc<EspnFetcher>,
    mlb: Arc<MlbFetcher>,
    nhl: Arc<NhlFetcher>,
    nba: Arc<NbaFetcher>,
}

impl FetcherSet {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            espn: Arc::new(EspnFetcher::new(client.clone(), config.espn_base_url.clone())),
            mlb: Arc::new(MlbFetcher::new(client.clone(), config.mlb_base_url.clone())),
            nhl: Arc::new(NhlFetcher::new(client.clone(), config.nhl_base_url.clone())),
            nba: Arc::new(NbaFetcher::new(client, config.nba_base_url.clone())),
        }
    }

    /// Selects the fetcher variant for a league. MLB, NHL and NBA use their
    /// dedicated league APIs; everything else goes through ESPN.
    pub fn for_league(&self, league: League) -> Arc<dyn Fetcher> {
        match league {
            League::Mlb => self.mlb.clone(),
            League::Nhl => self.nhl.clone(),
            League::Nba => self.nba.clone(),
            League::Nfl => self.espn.clone(),
        }
    }
}
