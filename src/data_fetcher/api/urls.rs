//! URL building utilities for the upstream scoreboard endpoints

use crate::data_fetcher::models::League;

/// Default base URL for ESPN's public site API
pub const ESPN_DEFAULT_BASE: &str = "https://site.api.espn.com/apis/site/v2/sports";

/// Default base URL for MLB StatsAPI
pub const MLB_DEFAULT_BASE: &str = "https://statsapi.mlb.com";

/// Default base URL for the NHL web API
pub const NHL_DEFAULT_BASE: &str = "https://api-web.nhle.com";

/// Default base URL for NBA live data
pub const NBA_DEFAULT_BASE: &str = "https://cdn.nba.com";

/// Builds an ESPN scoreboard URL for a league.
///
/// # Example
/// ```
/// use scorewatch::data_fetcher::api::build_espn_scoreboard_url;
/// use scorewatch::data_fetcher::models::League;
///
/// let url = build_espn_scoreboard_url("https://site.api.espn.com/apis/site/v2/sports", League::Nfl);
/// assert_eq!(
///     url,
///     "https://site.api.espn.com/apis/site/v2/sports/football/nfl/scoreboard"
/// );
/// ```
pub fn build_espn_scoreboard_url(base: &str, league: League) -> String {
    format!("{base}/{}/scoreboard", league.espn_path())
}

/// Builds the MLB StatsAPI schedule URL for today's games, hydrated with
/// linescore and team records so one request covers the whole display.
pub fn build_mlb_schedule_url(base: &str) -> String {
    format!("{base}/api/v1/schedule?sportId=1&hydrate=linescore,team")
}

/// Builds the NHL scoreboard-now URL
pub fn build_nhl_scoreboard_url(base: &str) -> String {
    format!("{base}/v1/scoreboard/now")
}

/// Builds the NBA today's-scoreboard URL
pub fn build_nba_scoreboard_url(base: &str) -> String {
    format!("{base}/static/json/liveData/scoreboard/todaysScoreboard_00.json")
}
