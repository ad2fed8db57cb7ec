//! ESPN site API fetcher
//!
//! ESPN's public scoreboard endpoint covers every league under one response
//! shape, so this fetcher doubles as the generic variant. The dedicated
//! league APIs (MLB StatsAPI, NHL, NBA) give richer in-game situation data;
//! NFL teams are served from here.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::fetch_utils::fetch_json;
use super::urls::build_espn_scoreboard_url;
use super::{team_matches, Fetcher};
use crate::data_fetcher::models::{
    GamePhase, League, ScoreBase, ScoreboardData, SportDetail, TeamDescriptor,
};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
struct EspnScoreboard {
    #[serde(default)]
    events: Vec<EspnEvent>,
}

#[derive(Debug, Deserialize)]
struct EspnEvent {
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    competitions: Vec<EspnCompetition>,
}

#[derive(Debug, Deserialize)]
struct EspnCompetition {
    #[serde(default)]
    competitors: Vec<EspnCompetitor>,
    #[serde(default)]
    status: Option<EspnStatus>,
    #[serde(default)]
    situation: Option<EspnSituation>,
}

#[derive(Debug, Deserialize)]
struct EspnCompetitor {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    team: Option<EspnTeam>,
    #[serde(rename = "homeAway", default)]
    home_away: String,
    #[serde(default)]
    score: Option<String>,
    #[serde(default)]
    records: Vec<EspnRecord>,
}

#[derive(Debug, Deserialize)]
struct EspnRecord {
    #[serde(default)]
    summary: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EspnTeam {
    #[serde(default)]
    abbreviation: Option<String>,
    #[serde(rename = "displayName", default)]
    display_name: Option<String>,
    #[serde(rename = "shortDisplayName", default)]
    short_display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EspnStatus {
    #[serde(default)]
    period: Option<u32>,
    #[serde(rename = "displayClock", default)]
    display_clock: Option<String>,
    #[serde(rename = "type", default)]
    status_type: Option<EspnStatusType>,
}

#[derive(Debug, Deserialize)]
struct EspnStatusType {
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    completed: bool,
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "shortDetail", default)]
    short_detail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EspnSituation {
    #[serde(rename = "downDistanceText", default)]
    down_distance_text: Option<String>,
    #[serde(default)]
    possession: Option<String>,
}

pub struct EspnFetcher {
    client: Client,
    base_url: String,
}

impl EspnFetcher {
    pub fn new(client: Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl Fetcher for EspnFetcher {
    fn name(&self) -> &str {
        "espn"
    }

    async fn fetch(&self, team: &TeamDescriptor) -> Result<ScoreboardData, AppError> {
        let url = build_espn_scoreboard_url(&self.base_url, team.league);
        let scoreboard: EspnScoreboard = fetch_json(&self.client, &url).await?;

        for event in &scoreboard.events {
            let Some(competition) = event.competitions.first() else {
                continue;
            };
            if competition
                .competitors
                .iter()
                .any(|c| competitor_matches(c, &team.display_name))
            {
                return normalize_event(event, competition, team, &url);
            }
        }

        debug!("No scheduled game for {} in ESPN scoreboard", team);
        Ok(no_game_today(team))
    }
}

fn competitor_matches(competitor: &EspnCompetitor, wanted: &str) -> bool {
    let Some(espn_team) = competitor.team.as_ref() else {
        return false;
    };
    [
        espn_team.display_name.as_deref(),
        espn_team.short_display_name.as_deref(),
        espn_team.abbreviation.as_deref(),
    ]
    .into_iter()
    .flatten()
    .any(|name| team_matches(name, wanted))
}

fn no_game_today(team: &TeamDescriptor) -> ScoreboardData {
    ScoreboardData {
        base: ScoreBase {
            home_team: team.display_name.clone(),
            bottom_info: "No game today".to_string(),
            phase: GamePhase::NoGame,
            ..ScoreBase::default()
        },
        detail: SportDetail::None,
        has_data: false,
        currently_playing: false,
    }
}

fn normalize_event(
    event: &EspnEvent,
    competition: &EspnCompetition,
    team: &TeamDescriptor,
    url: &str,
) -> Result<ScoreboardData, AppError> {
    let status = competition
        .status
        .as_ref()
        .ok_or_else(|| AppError::missing_field("competitions[].status", "espn"))?;
    let status_type = status
        .status_type
        .as_ref()
        .ok_or_else(|| AppError::missing_field("competitions[].status.type", "espn"))?;

    let mut base = ScoreBase::default();
    let mut possession_id = None;

    for competitor in &competition.competitors {
        let Some(espn_team) = competitor.team.as_ref() else {
            continue;
        };
        let name = espn_team
            .display_name
            .clone()
            .or_else(|| espn_team.short_display_name.clone())
            .unwrap_or_default();
        let score = competitor.score.clone().unwrap_or_default();
        let record = competitor
            .records
            .first()
            .and_then(|r| r.summary.clone());

        match competitor.home_away.as_str() {
            "home" => {
                base.home_team = name;
                base.home_score = score;
                base.home_record = record;
            }
            "away" => {
                base.away_team = name;
                base.away_score = score;
                base.away_record = record;
            }
            _ => {}
        }
    }

    if base.home_team.is_empty() || base.away_team.is_empty() {
        return Err(AppError::api_unexpected_structure(
            "Scoreboard event is missing a home or away competitor",
            url,
        ));
    }

    base.phase = phase_from_status(status_type);
    base.top_info = status_type.short_detail.clone().unwrap_or_default();
    base.start_time = event.date.as_deref().and_then(parse_espn_date);

    let situation = competition.situation.as_ref();
    if let Some(situation) = situation {
        possession_id = situation.possession.clone();
        if let Some(dd) = &situation.down_distance_text {
            base.bottom_info = dd.clone();
        }
    }

    let detail = match team.league {
        League::Nfl => SportDetail::Football {
            quarter: status.period.map(|p| format!("Q{p}")).unwrap_or_default(),
            clock: status.display_clock.clone().unwrap_or_default(),
            down_distance: situation
                .and_then(|s| s.down_distance_text.clone())
                .unwrap_or_default(),
            possession: possession_team_name(competition, possession_id.as_deref()),
        },
        _ => SportDetail::None,
    };

    let currently_playing = base.phase.is_live();
    Ok(ScoreboardData {
        base,
        detail,
        has_data: true,
        currently_playing,
    })
}

fn phase_from_status(status_type: &EspnStatusType) -> GamePhase {
    if status_type.completed {
        return GamePhase::Final;
    }
    if status_type
        .name
        .as_deref()
        .is_some_and(|n| n.contains("POSTPONED") || n.contains("CANCELED"))
    {
        return GamePhase::Postponed;
    }
    match status_type.state.as_deref() {
        Some("in") => GamePhase::Live,
        Some("pre") => GamePhase::Scheduled,
        Some("post") => GamePhase::Final,
        _ => GamePhase::Scheduled,
    }
}

/// Resolve ESPN's possession competitor id back to a team name
fn possession_team_name(competition: &EspnCompetition, possession_id: Option<&str>) -> Option<String> {
    let id = possession_id?;
    competition
        .competitors
        .iter()
        .find(|c| c.id.as_deref() == Some(id))
        .and_then(|c| c.team.as_ref())
        .and_then(|t| t.short_display_name.clone().or_else(|| t.display_name.clone()))
}

/// ESPN event dates come back as RFC 3339 but usually without seconds
/// ("2026-02-09T00:00Z")
fn parse_espn_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%MZ")
        .ok()
        .map(|naive| naive.and_utc())
}
