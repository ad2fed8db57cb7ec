//! Core data model: team descriptors and the normalized per-team
//! scoreboard record published to the display consumer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// League a configured team belongs to. Selects the fetcher variant and
/// upstream endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum League {
    Mlb,
    Nhl,
    Nba,
    Nfl,
}

impl League {
    /// Short code used in cache fingerprints, logs and config files
    pub fn code(&self) -> &'static str {
        match self {
            League::Mlb => "mlb",
            League::Nhl => "nhl",
            League::Nba => "nba",
            League::Nfl => "nfl",
        }
    }

    /// Sport the league plays, as ESPN spells it in URL paths
    pub fn sport(&self) -> &'static str {
        match self {
            League::Mlb => "baseball",
            League::Nhl => "hockey",
            League::Nba => "basketball",
            League::Nfl => "football",
        }
    }

    /// ESPN scoreboard path segment, e.g. `baseball/mlb`
    pub fn espn_path(&self) -> String {
        format!("{}/{}", self.sport(), self.code())
    }

    pub fn parse(code: &str) -> Result<Self, AppError> {
        match code.to_lowercase().as_str() {
            "mlb" => Ok(League::Mlb),
            "nhl" => Ok(League::Nhl),
            "nba" => Ok(League::Nba),
            "nfl" => Ok(League::Nfl),
            other => Err(AppError::config_error(format!(
                "Unknown league code: {other} (expected mlb, nhl, nba or nfl)"
            ))),
        }
    }
}

impl std::fmt::Display for League {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Immutable team identity created at configuration load. The league
/// implies the sport, so no separate sport code is stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TeamDescriptor {
    pub display_name: String,
    pub league: League,
}

impl TeamDescriptor {
    pub fn new(display_name: impl Into<String>, league: League) -> Self {
        Self {
            display_name: display_name.into(),
            league,
        }
    }
}

impl std::fmt::Display for TeamDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.display_name, self.league)
    }
}

/// Where the team's game stands at fetch time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    #[default]
    NoGame,
    Scheduled,
    Live,
    Final,
    Postponed,
}

impl GamePhase {
    pub fn is_live(&self) -> bool {
        matches!(self, GamePhase::Live)
    }
}

/// Fields every sport populates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ScoreBase {
    pub home_team: String,
    pub away_team: String,
    /// Scores kept as display strings; an unstarted game shows empty
    pub home_score: String,
    pub away_score: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_record: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub away_record: Option<String>,
    /// Upper status line, e.g. "Top 7th" or "2nd Period"
    #[serde(default)]
    pub top_info: String,
    /// Lower status line, e.g. "2 outs, runners on 1st and 3rd"
    #[serde(default)]
    pub bottom_info: String,
    #[serde(default)]
    pub phase: GamePhase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
}

/// Sport-specific situation payload. Leagues populate different subsets of
/// the display, so the variant carries only what that sport renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "sport", rename_all = "snake_case")]
pub enum SportDetail {
    Baseball {
        inning: u32,
        is_top_inning: bool,
        balls: u32,
        strikes: u32,
        outs: u32,
        /// Occupied bases: first, second, third
        runners_on: [bool; 3],
    },
    Hockey {
        period: String,
        clock: String,
        power_play: bool,
    },
    Basketball {
        quarter: String,
        clock: String,
    },
    Football {
        quarter: String,
        clock: String,
        down_distance: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        possession: Option<String>,
    },
    #[default]
    None,
}

/// One team's normalized fetch result: the shared display base, the
/// sport-specific payload and the two flags the snapshot lists are built
/// from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ScoreboardData {
    pub base: ScoreBase,
    #[serde(default)]
    pub detail: SportDetail,
    #[serde(default)]
    pub has_data: bool,
    #[serde(default)]
    pub currently_playing: bool,
}

impl ScoreboardData {
    /// Empty record substituted when a team's fetch failed and no cached
    /// fallback was usable. Keeps the snapshot lists aligned.
    pub fn not_fetched(team: &TeamDescriptor) -> Self {
        Self {
            base: ScoreBase {
                home_team: team.display_name.clone(),
                bottom_info: "No data".to_string(),
                ..ScoreBase::default()
            },
            detail: SportDetail::None,
            has_data: false,
            currently_playing: false,
        }
    }
}

/// One complete fetch cycle's output: three parallel lists (one entry per
/// configured team, in configuration order) plus the cycle timestamp.
/// Replaced wholesale each cycle; readers copy it out under one lock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub teams_with_data: Vec<bool>,
    pub team_info: Vec<ScoreboardData>,
    pub teams_currently_playing: Vec<bool>,
    pub fetched_at: DateTime<Utc>,
}

impl Snapshot {
    /// Builds the parallel lists from per-team results, preserving order.
    pub fn from_results(results: Vec<ScoreboardData>) -> Self {
        let teams_with_data = results.iter().map(|r| r.has_data).collect();
        let teams_currently_playing = results.iter().map(|r| r.currently_playing).collect();
        Self {
            teams_with_data,
            team_info: results,
            teams_currently_playing,
            fetched_at: Utc::now(),
        }
    }

    pub fn empty() -> Self {
        Self::from_results(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.team_info.len()
    }

    pub fn is_empty(&self) -> bool {
        self.team_info.is_empty()
    }

    pub fn any_playing(&self) -> bool {
        self.teams_currently_playing.iter().any(|p| *p)
    }
}
