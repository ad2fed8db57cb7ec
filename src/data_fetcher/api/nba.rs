//! NBA live-data fetcher

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::fetch_utils::fetch_json;
use super::urls::build_nba_scoreboard_url;
use super::{team_matches, Fetcher};
use crate::data_fetcher::models::{
    GamePhase, ScoreBase, ScoreboardData, SportDetail, TeamDescriptor,
};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
struct NbaResponse {
    scoreboard: NbaScoreboard,
}

#[derive(Debug, Deserialize)]
struct NbaScoreboard {
    #[serde(default)]
    games: Vec<NbaGame>,
}

#[derive(Debug, Deserialize)]
struct NbaGame {
    /// 1 = scheduled, 2 = live, 3 = final
    #[serde(rename = "gameStatus", default)]
    game_status: Option<u8>,
    #[serde(rename = "gameStatusText", default)]
    game_status_text: Option<String>,
    #[serde(default)]
    period: Option<u32>,
    #[serde(rename = "gameClock", default)]
    game_clock: Option<String>,
    #[serde(rename = "gameTimeUTC", default)]
    game_time_utc: Option<String>,
    #[serde(rename = "homeTeam")]
    home_team: NbaTeam,
    #[serde(rename = "awayTeam")]
    away_team: NbaTeam,
}

#[derive(Debug, Deserialize)]
struct NbaTeam {
    #[serde(rename = "teamCity", default)]
    team_city: Option<String>,
    #[serde(rename = "teamName", default)]
    team_name: Option<String>,
    #[serde(default)]
    wins: Option<i64>,
    #[serde(default)]
    losses: Option<i64>,
    #[serde(default)]
    score: Option<i64>,
}

impl NbaTeam {
    fn full_name(&self) -> String {
        match (&self.team_city, &self.team_name) {
            (Some(city), Some(name)) => format!("{city} {name}"),
            (Some(city), None) => city.clone(),
            (None, Some(name)) => name.clone(),
            (None, None) => String::new(),
        }
    }

    fn record(&self) -> Option<String> {
        match (self.wins, self.losses) {
            (Some(wins), Some(losses)) => Some(format!("{wins}-{losses}")),
            _ => None,
        }
    }
}

pub struct NbaFetcher {
    client: Client,
    base_url: String,
}

impl NbaFetcher {
    pub fn new(client: Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl Fetcher for NbaFetcher {
    fn name(&self) -> &str {
        "nba"
    }

    async fn fetch(&self, team: &TeamDescriptor) -> Result<ScoreboardData, AppError> {
        let url = build_nba_scoreboard_url(&self.base_url);
        let response: NbaResponse = fetch_json(&self.client, &url).await?;

        for game in &response.scoreboard.games {
            if team_matches(&game.home_team.full_name(), &team.display_name)
                || team_matches(&game.away_team.full_name(), &team.display_name)
            {
                return normalize_game(game);
            }
        }

        debug!("No scheduled game for {} in NBA scoreboard", team);
        Ok(ScoreboardData {
            base: ScoreBase {
                home_team: team.display_name.clone(),
                bottom_info: "No game today".to_string(),
                phase: GamePhase::NoGame,
                ..ScoreBase::default()
            },
            detail: SportDetail::None,
            has_data: false,
            currently_playing: false,
        })
    }
}

fn normalize_game(game: &NbaGame) -> Result<ScoreboardData, AppError> {
    let phase = match game.game_status {
        Some(1) => GamePhase::Scheduled,
        Some(2) => GamePhase::Live,
        Some(3) => GamePhase::Final,
        _ => {
            return Err(AppError::missing_field("games[].gameStatus", "nba"));
        }
    };

    let status_text = game.game_status_text.clone().unwrap_or_default();
    let show_score = !matches!(phase, GamePhase::Scheduled);

    let base = ScoreBase {
        home_team: game.home_team.full_name(),
        away_team: game.away_team.full_name(),
        home_score: score_text(game.home_team.score, show_score),
        away_score: score_text(game.away_team.score, show_score),
        home_record: game.home_team.record(),
        away_record: game.away_team.record(),
        top_info: status_text.trim().to_string(),
        bottom_info: String::new(),
        phase,
        start_time: game
            .game_time_utc
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|parsed| parsed.with_timezone(&Utc)),
    };

    let detail = if phase.is_live() {
        SportDetail::Basketball {
            quarter: game.period.map(|p| format!("Q{p}")).unwrap_or_default(),
            clock: game
                .game_clock
                .as_deref()
                .map(parse_game_clock)
                .unwrap_or_default(),
        }
    } else {
        SportDetail::None
    };

    Ok(ScoreboardData {
        base,
        detail,
        has_data: true,
        currently_playing: phase.is_live(),
    })
}

fn score_text(score: Option<i64>, show: bool) -> String {
    if !show {
        return String::new();
    }
    score.map(|s| s.to_string()).unwrap_or_default()
}

/// NBA clocks arrive in ISO 8601 duration form ("PT05M23.00S"); render the
/// familiar "5:23". Anything unrecognized passes through untouched.
fn parse_game_clock(raw: &str) -> String {
    let Some(rest) = raw.strip_prefix("PT") else {
        return raw.to_string();
    };
    let Some((minutes, seconds)) = rest.split_once('M') else {
        return raw.to_string();
    };
    let seconds = seconds.trim_end_matches('S');
    let seconds = seconds.split('.').next().unwrap_or(seconds);
    match (minutes.parse::<u32>(), seconds.parse::<u32>()) {
        (Ok(m), Ok(s)) => format!("{m}:{s:02}"),
        _ => raw.to_string(),
    }
}
