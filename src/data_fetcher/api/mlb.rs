//! MLB StatsAPI fetcher
//!
//! One schedule request hydrated with linescore and team data covers the
//! whole display: scores, records, inning state and baserunners.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::fetch_utils::fetch_json;
use super::urls::build_mlb_schedule_url;
use super::{team_matches, Fetcher};
use crate::data_fetcher::models::{
    GamePhase, ScoreBase, ScoreboardData, SportDetail, TeamDescriptor,
};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
struct MlbSchedule {
    #[serde(default)]
    dates: Vec<MlbDate>,
}

#[derive(Debug, Deserialize)]
struct MlbDate {
    #[serde(default)]
    games: Vec<MlbGame>,
}

#[derive(Debug, Deserialize)]
struct MlbGame {
    #[serde(rename = "gameDate", default)]
    game_date: Option<String>,
    #[serde(default)]
    status: Option<MlbStatus>,
    teams: MlbGameTeams,
    #[serde(default)]
    linescore: Option<MlbLinescore>,
}

#[derive(Debug, Deserialize)]
struct MlbStatus {
    #[serde(rename = "abstractGameState", default)]
    abstract_game_state: Option<String>,
    #[serde(rename = "detailedState", default)]
    detailed_state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MlbGameTeams {
    home: MlbTeamSide,
    away: MlbTeamSide,
}

#[derive(Debug, Deserialize)]
struct MlbTeamSide {
    #[serde(default)]
    score: Option<i64>,
    team: MlbTeamInfo,
    #[serde(rename = "leagueRecord", default)]
    league_record: Option<MlbLeagueRecord>,
}

#[derive(Debug, Deserialize)]
struct MlbTeamInfo {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct MlbLeagueRecord {
    #[serde(default)]
    wins: i64,
    #[serde(default)]
    losses: i64,
}

#[derive(Debug, Deserialize)]
struct MlbLinescore {
    #[serde(rename = "currentInning", default)]
    current_inning: Option<u32>,
    #[serde(rename = "currentInningOrdinal", default)]
    current_inning_ordinal: Option<String>,
    #[serde(rename = "inningState", default)]
    inning_state: Option<String>,
    #[serde(default)]
    balls: Option<u32>,
    #[serde(default)]
    strikes: Option<u32>,
    #[serde(default)]
    outs: Option<u32>,
    #[serde(default)]
    offense: Option<MlbOffense>,
}

/// The offense object carries a player object per occupied base and omits
/// the key for empty ones
#[derive(Debug, Deserialize)]
struct MlbOffense {
    #[serde(default)]
    first: Option<serde_json::Value>,
    #[serde(default)]
    second: Option<serde_json::Value>,
    #[serde(default)]
    third: Option<serde_json::Value>,
}

impl MlbOffense {
    fn runners_on(&self) -> [bool; 3] {
        [
            base_occupied(&self.first),
            base_occupied(&self.second),
            base_occupied(&self.third),
        ]
    }
}

fn base_occupied(value: &Option<serde_json::Value>) -> bool {
    matches!(value, Some(serde_json::Value::Object(_)))
}

pub struct MlbFetcher {
    client: Client,
    base_url: String,
}

impl MlbFetcher {
    pub fn new(client: Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl Fetcher for MlbFetcher {
    fn name(&self) -> &str {
        "mlb"
    }

    async fn fetch(&self, team: &TeamDescriptor) -> Result<ScoreboardData, AppError> {
        let url = build_mlb_schedule_url(&self.base_url);
        let schedule: MlbSchedule = fetch_json(&self.client, &url).await?;

        for date in &schedule.dates {
            for game in &date.games {
                if team_matches(&game.teams.home.team.name, &team.display_name)
                    || team_matches(&game.teams.away.team.name, &team.display_name)
                {
                    return normalize_game(game);
                }
            }
        }

        debug!("No scheduled game for {} in MLB schedule", team);
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

fn normalize_game(game: &MlbGame) -> Result<ScoreboardData, AppError> {
    let status = game
        .status
        .as_ref()
        .ok_or_else(|| AppError::missing_field("games[].status", "mlb"))?;

    let phase = phase_from_status(status);
    let mut base = ScoreBase {
        home_team: game.teams.home.team.name.clone(),
        away_team: game.teams.away.team.name.clone(),
        home_score: score_text(game.teams.home.score, phase),
        away_score: score_text(game.teams.away.score, phase),
        home_record: record_text(&game.teams.home.league_record),
        away_record: record_text(&game.teams.away.league_record),
        phase,
        start_time: game
            .game_date
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|parsed| parsed.with_timezone(&Utc)),
        ..ScoreBase::default()
    };

    let mut detail = SportDetail::None;
    match phase {
        GamePhase::Live => {
            let linescore = game
                .linescore
                .as_ref()
                .ok_or_else(|| AppError::missing_field("games[].linescore", "mlb"))?;
            let inning = linescore.current_inning.unwrap_or(1);
            let outs = linescore.outs.unwrap_or(0);
            let runners_on = linescore
                .offense
                .as_ref()
                .map(MlbOffense::runners_on)
                .unwrap_or_default();
            let is_top_inning = linescore
                .inning_state
                .as_deref()
                .is_some_and(|s| s.eq_ignore_ascii_case("top"));

            base.top_info = format!(
                "{} {}",
                linescore.inning_state.clone().unwrap_or_default(),
                linescore
                    .current_inning_ordinal
                    .clone()
                    .unwrap_or_else(|| inning.to_string())
            )
            .trim()
            .to_string();
            base.bottom_info = format!("{}, {}", outs_text(outs), runners_text(runners_on));

            detail = SportDetail::Baseball {
                inning,
                is_top_inning,
                balls: linescore.balls.unwrap_or(0),
                strikes: linescore.strikes.unwrap_or(0),
                outs,
                runners_on,
            };
        }
        _ => {
            base.bottom_info = status.detailed_state.clone().unwrap_or_default();
        }
    }

    Ok(ScoreboardData {
        base,
        detail,
        has_data: true,
        currently_playing: phase.is_live(),
    })
}

fn phase_from_status(status: &MlbStatus) -> GamePhase {
    if status
        .detailed_state
        .as_deref()
        .is_some_and(|s| s.contains("Postponed"))
    {
        return GamePhase::Postponed;
    }
    match status.abstract_game_state.as_deref() {
        Some("Live") => GamePhase::Live,
        Some("Final") => GamePhase::Final,
        Some("Preview") => GamePhase::Scheduled,
        _ => GamePhase::Scheduled,
    }
}

fn score_text(score: Option<i64>, phase: GamePhase) -> String {
    match (score, phase) {
        (_, GamePhase::Scheduled | GamePhase::NoGame | GamePhase::Postponed) => String::new(),
        (Some(score), _) => score.to_string(),
        (None, _) => String::new(),
    }
}

fn record_text(record: &Option<MlbLeagueRecord>) -> Option<String> {
    record
        .as_ref()
        .map(|r| format!("{}-{}", r.wins, r.losses))
}

fn outs_text(outs: u32) -> String {
    if outs == 1 {
        "1 Out".to_string()
    } else {
        format!("{outs} Outs")
    }
}

fn runners_text(runners_on: [bool; 3]) -> String {
    const NAMES: [&str; 3] = ["1st", "2nd", "3rd"];
    let occupied: Vec<&str> = runners_on
        .iter()
        .zip(NAMES)
        .filter_map(|(on, name)| on.then_some(name))
        .collect();

    match occupied.as_slice() {
        [] => "Bases empty".to_string(),
        [one] => format!("Runner on {one}"),
        [first, second] => format!("Runners on {first} and {second}"),
        _ => "Bases loaded".to_string(),
    }
}
