//! NHL web API fetcher

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::fetch_utils::fetch_json;
use super::urls::build_nhl_scoreboard_url;
use super::{ordinal, team_matches, Fetcher};
use crate::data_fetcher::models::{
    GamePhase, ScoreBase, ScoreboardData, SportDetail, TeamDescriptor,
};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
struct NhlScoreboard {
    #[serde(rename = "gamesByDate", default)]
    games_by_date: Vec<NhlGamesByDate>,
}

#[derive(Debug, Deserialize)]
struct NhlGamesByDate {
    #[serde(default)]
    games: Vec<NhlGame>,
}

#[derive(Debug, Deserialize)]
struct NhlGame {
    #[serde(rename = "startTimeUTC", default)]
    start_time_utc: Option<String>,
    #[serde(rename = "gameState", default)]
    game_state: Option<String>,
    #[serde(rename = "gameScheduleState", default)]
    game_schedule_state: Option<String>,
    #[serde(rename = "periodDescriptor", default)]
    period_descriptor: Option<NhlPeriodDescriptor>,
    #[serde(default)]
    clock: Option<NhlClock>,
    #[serde(rename = "homeTeam")]
    home_team: NhlTeam,
    #[serde(rename = "awayTeam")]
    away_team: NhlTeam,
    #[serde(default)]
    situation: Option<NhlSituation>,
}

#[derive(Debug, Deserialize)]
struct NhlPeriodDescriptor {
    #[serde(default)]
    number: Option<u32>,
    #[serde(rename = "periodType", default)]
    period_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NhlClock {
    #[serde(rename = "timeRemaining", default)]
    time_remaining: Option<String>,
    #[serde(rename = "inIntermission", default)]
    in_intermission: bool,
}

#[derive(Debug, Deserialize)]
struct NhlTeam {
    #[serde(default)]
    name: Option<NhlLocalizedName>,
    #[serde(default)]
    score: Option<i64>,
    #[serde(default)]
    record: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NhlLocalizedName {
    #[serde(default)]
    default: String,
}

#[derive(Debug, Deserialize)]
struct NhlSituation {
    #[serde(rename = "homeTeam", default)]
    home_team: Option<NhlSituationSide>,
    #[serde(rename = "awayTeam", default)]
    away_team: Option<NhlSituationSide>,
}

#[derive(Debug, Deserialize)]
struct NhlSituationSide {
    #[serde(rename = "situationDescriptions", default)]
    situation_descriptions: Vec<String>,
}

impl NhlSituation {
    /// True while either side is on the power play
    fn power_play(&self) -> bool {
        [&self.home_team, &self.away_team]
            .into_iter()
            .flatten()
            .flat_map(|side| &side.situation_descriptions)
            .any(|desc| desc == "PP")
    }
}

pub struct NhlFetcher {
    client: Client,
    base_url: String,
}

impl NhlFetcher {
    pub fn new(client: Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl Fetcher for NhlFetcher {
    fn name(&self) -> &str {
        "nhl"
    }

    async fn fetch(&self, team: &TeamDescriptor) -> Result<ScoreboardData, AppError> {
        let url = build_nhl_scoreboard_url(&self.base_url);
        let scoreboard: NhlScoreboard = fetch_json(&self.client, &url).await?;

        for day in &scoreboard.games_by_date {
            for game in &day.games {
                let home_name = team_name(&game.home_team);
                let away_name = team_name(&game.away_team);
                if team_matches(home_name, &team.display_name)
                    || team_matches(away_name, &team.display_name)
                {
                    return normalize_game(game);
                }
            }
        }

        debug!("No scheduled game for {} in NHL scoreboard", team);
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

fn team_name(team: &NhlTeam) -> &str {
    team.name.as_ref().map(|n| n.default.as_str()).unwrap_or("")
}

fn normalize_game(game: &NhlGame) -> Result<ScoreboardData, AppError> {
    let phase = phase_from_state(game);
    let period_label = game
        .period_descriptor
        .as_ref()
        .map(period_text)
        .unwrap_or_default();
    let clock = game
        .clock
        .as_ref()
        .and_then(|c| c.time_remaining.clone())
        .unwrap_or_default();
    let in_intermission = game.clock.as_ref().is_some_and(|c| c.in_intermission);
    let power_play = game
        .situation
        .as_ref()
        .is_some_and(NhlSituation::power_play);

    let mut base = ScoreBase {
        home_team: team_name(&game.home_team).to_string(),
        away_team: team_name(&game.away_team).to_string(),
        home_record: game.home_team.record.clone(),
        away_record: game.away_team.record.clone(),
        phase,
        start_time: game
            .start_time_utc
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|parsed| parsed.with_timezone(&Utc)),
        ..ScoreBase::default()
    };

    if base.home_team.is_empty() || base.away_team.is_empty() {
        return Err(AppError::missing_field("games[].homeTeam.name", "nhl"));
    }

    let mut detail = SportDetail::None;
    match phase {
        GamePhase::Live => {
            base.home_score = score_text(game.home_team.score);
            base.away_score = score_text(game.away_team.score);
            base.top_info = if in_intermission {
                format!("{period_label} Intermission")
            } else {
                period_label.clone()
            };
            base.bottom_info = if power_play {
                "Power Play".to_string()
            } else {
                String::new()
            };
            detail = SportDetail::Hockey {
                period: period_label,
                clock,
                power_play,
            };
        }
        GamePhase::Final => {
            base.home_score = score_text(game.home_team.score);
            base.away_score = score_text(game.away_team.score);
            base.bottom_info = "Final".to_string();
        }
        _ => {}
    }

    Ok(ScoreboardData {
        base,
        detail,
        has_data: true,
        currently_playing: phase.is_live(),
    })
}

fn phase_from_state(game: &NhlGame) -> GamePhase {
    if game.game_schedule_state.as_deref() == Some("PPD") {
        return GamePhase::Postponed;
    }
    match game.game_state.as_deref() {
        Some("LIVE") | Some("CRIT") => GamePhase::Live,
        Some("FINAL") | Some("OFF") => GamePhase::Final,
        Some("FUT") | Some("PRE") => GamePhase::Scheduled,
        _ => GamePhase::Scheduled,
    }
}

fn score_text(score: Option<i64>) -> String {
    score.map(|s| s.to_string()).unwrap_or_default()
}

/// "1st Period" through "3rd Period", then "OT"/"SO" by period type
fn period_text(descriptor: &NhlPeriodDescriptor) -> String {
    match descriptor.period_type.as_deref() {
        Some("OT") => "OT".to_string(),
        Some("SO") => "SO".to_string(),
        _ => descriptor
            .number
            .map(|n| format!("{} Period", ordinal(n)))
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_fetcher::api::http_client::create_test_http_client;
    use crate::data_fetcher::models::League;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn scoreboard_body(game_state: &str) -> serde_json::Value {
        serde_json::json!({
            "focusedDate": "2026-02-08",
            "gamesByDate": [{
                "date": "2026-02-08",
                "games": [{
                    "id": 2025020500i64,
                    "startTimeUTC": "2026-02-09T00:00:00Z",
                    "gameState": game_state,
                    "periodDescriptor": {"number": 2, "periodType": "REG"},
                    "clock": {"timeRemaining": "12:34", "inIntermission": false},
                    "homeTeam": {
                        "name": {"default": "Boston Bruins"},
                        "score": 2,
                        "record": "30-10-5"
                    },
                    "awayTeam": {
                        "name": {"default": "Toronto Maple Leafs"},
                        "score": 1,
                        "record": "28-14-3"
                    },
                    "situation": {
                        "homeTeam": {"situationDescriptions": ["PP"]},
                        "awayTeam": {"situationDescriptions": []}
                    }
                }]
            }]
        })
    }

    async fn mock_scoreboard(server: &MockServer, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/v1/scoreboard/now"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_fetch_live_game_with_power_play() {
        let server = MockServer::start().await;
        mock_scoreboard(&server, scoreboard_body("LIVE")).await;

        let fetcher = NhlFetcher::new(create_test_http_client(), server.uri());
        let team = TeamDescriptor::new("Boston Bruins", League::Nhl);
        let data = fetcher.fetch(&team).await.unwrap();

        assert!(data.has_data);
        assert!(data.currently_playing);
        assert_eq!(data.base.home_score, "2");
        assert_eq!(data.base.away_score, "1");
        assert_eq!(data.base.top_info, "2nd Period");
        assert_eq!(data.base.bottom_info, "Power Play");
        assert_eq!(data.base.home_record.as_deref(), Some("30-10-5"));

        match data.detail {
            SportDetail::Hockey {
                period,
                clock,
                power_play,
            } => {
                assert_eq!(period, "2nd Period");
                assert_eq!(clock, "12:34");
                assert!(power_play);
            }
            other => panic!("Expected hockey detail, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_final_game() {
        let server = MockServer::start().await;
        mock_scoreboard(&server, scoreboard_body("OFF")).await;

        let fetcher = NhlFetcher::new(create_test_http_client(), server.uri());
        let team = TeamDescriptor::new("Maple Leafs", League::Nhl);
        let data = fetcher.fetch(&team).await.unwrap();

        assert!(data.has_data);
        assert!(!data.currently_playing);
        assert_eq!(data.base.phase, GamePhase::Final);
        assert_eq!(data.base.bottom_info, "Final");
        assert_eq!(data.detail, SportDetail::None);
    }

    #[tokio::test]
    async fn test_fetch_scheduled_game_hides_score() {
        let server = MockServer::start().await;
        mock_scoreboard(&server, scoreboard_body("FUT")).await;

        let fetcher = NhlFetcher::new(create_test_http_client(), server.uri());
        let team = TeamDescriptor::new("Bruins", League::Nhl);
        let data = fetcher.fetch(&team).await.unwrap();

        assert_eq!(data.base.phase, GamePhase::Scheduled);
        assert_eq!(data.base.home_score, "");
        assert!(data.base.start_time.is_some());
    }

    #[tokio::test]
    async fn test_fetch_no_game_today() {
        let server = MockServer::start().await;
        mock_scoreboard(&server, serde_json::json!({"gamesByDate": []})).await;

        let fetcher = NhlFetcher::new(create_test_http_client(), server.uri());
        let team = TeamDescriptor::new("Boston Bruins", League::Nhl);
        let data = fetcher.fetch(&team).await.unwrap();

        assert!(!data.has_data);
        assert_eq!(data.base.phase, GamePhase::NoGame);
    }

    #[test]
    fn test_period_text_overtime() {
        let descriptor = NhlPeriodDescriptor {
            number: Some(4),
            period_type: Some("OT".to_string()),
        };
        assert_eq!(period_text(&descriptor), "OT");
    }

    #[test]
    fn test_phase_postponed_overrides_state() {
        let body = scoreboard_body("FUT");
        let mut game: NhlGame =
            serde_json::from_value(body["gamesByDate"][0]["games"][0].clone()).unwrap();
        game.game_schedule_state = Some("PPD".to_string());
        assert_eq!(phase_from_state(&game), GamePhase::Postponed);
    }
}
