use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;

use crate::data_fetcher::models::{League, TeamDescriptor};
use crate::error::AppError;

fn get_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
        .usage(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Yellow.on_default())
        .error(AnsiColor::Red.on_default().effects(Effects::BOLD))
        .valid(AnsiColor::Green.on_default())
        .invalid(AnsiColor::Red.on_default())
}

/// Determines if the application should run in single-shot mode.
/// Single-shot mode is used when any of these conditions are met:
/// - --once flag is set (run one fetch cycle and exit)
/// - config operations are requested
/// - --debug mode is enabled (debug mode always runs once and exits)
pub fn is_single_shot_mode(args: &Args) -> bool {
    args.once || args.list_config || args.save_config || args.debug
}

/// Live sports scoreboard poller
///
/// Polls public sports APIs (ESPN, MLB StatsAPI, NHL, NBA) for the
/// configured teams and prints a continuously refreshed scoreboard.
///
/// The poller automatically refreshes:
/// - Every few seconds when one of your teams is playing
/// - Every few minutes otherwise
///
/// With --delay the display deliberately lags real time, matching a
/// television broadcast delay so scores never spoil the picture.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(styles = get_styles())]
pub struct Args {
    /// Fetch scores once, print them and exit immediately. Useful for
    /// scripts or quick score checks.
    #[arg(short, long)]
    pub once: bool,

    /// Follow a team for this run without touching the config file.
    /// Format: "TEAM NAME:LEAGUE", e.g. "Boston Bruins:nhl". Repeatable.
    #[arg(short = 't', long = "team", value_name = "NAME:LEAGUE")]
    pub teams: Vec<String>,

    /// Enable the broadcast delay for this run
    #[arg(long = "delay", help_heading = "Display Options")]
    pub delay: bool,

    /// Disable the broadcast delay for this run
    #[arg(long = "no-delay", help_heading = "Display Options", conflicts_with = "delay")]
    pub no_delay: bool,

    /// Broadcast delay length in seconds (implies --delay)
    #[arg(long = "delay-seconds", help_heading = "Display Options")]
    pub delay_seconds: Option<u64>,

    /// Override the live refresh interval in seconds. Lower values follow
    /// the action more closely but hit the upstream APIs harder.
    #[arg(long = "live-interval", help_heading = "Display Options")]
    pub live_interval: Option<u64>,

    /// Override the idle refresh interval in seconds
    #[arg(long = "idle-interval", help_heading = "Display Options")]
    pub idle_interval: Option<u64>,

    /// Persist the effective team list and intervals to the config file
    #[arg(long = "save-config", help_heading = "Configuration")]
    pub save_config: bool,

    /// List current configuration settings
    #[arg(long = "list-config", short = 'l', help_heading = "Configuration")]
    pub list_config: bool,

    /// Enable debug mode: runs a single fetch cycle with verbose logging
    /// to stdout and does not start the background loop.
    #[arg(long = "debug", help_heading = "Debug")]
    pub debug: bool,

    /// Specify a custom log file path. If not provided, logs will be written to the default location.
    #[arg(long = "log-file", help_heading = "Debug")]
    pub log_file: Option<String>,
}

/// Parses a `--team` argument of the form "TEAM NAME:LEAGUE"
pub fn parse_team_arg(raw: &str) -> Result<TeamDescriptor, AppError> {
    let (name, league) = raw.rsplit_once(':').ok_or_else(|| {
        AppError::config_error(format!(
            "Invalid team argument '{raw}' (expected \"TEAM NAME:LEAGUE\", e.g. \"Boston Bruins:nhl\")"
        ))
    })?;
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::config_error(format!(
            "Invalid team argument '{raw}': team name is empty"
        )));
    }
    Ok(TeamDescriptor::new(name, League::parse(league.trim())?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_team_arg() {
        let team = parse_team_arg("Boston Bruins:nhl").unwrap();
        assert_eq!(team.display_name, "Boston Bruins");
        assert_eq!(team.league, League::Nhl);

        let team = parse_team_arg("Dallas Cowboys : NFL").unwrap();
        assert_eq!(team.display_name, "Dallas Cowboys");
        assert_eq!(team.league, League::Nfl);
    }

    #[test]
    fn test_parse_team_arg_rejects_bad_input() {
        assert!(parse_team_arg("Boston Bruins").is_err());
        assert!(parse_team_arg(":nhl").is_err());
        assert!(parse_team_arg("Boston Bruins:khl").is_err());
    }

    #[test]
    fn test_single_shot_mode() {
        let args = Args::parse_from(["scorewatch", "--once"]);
        assert!(is_single_shot_mode(&args));

        let args = Args::parse_from(["scorewatch", "--list-config"]);
        assert!(is_single_shot_mode(&args));

        let args = Args::parse_from(["scorewatch", "--debug"]);
        assert!(is_single_shot_mode(&args));

        let args = Args::parse_from(["scorewatch"]);
        assert!(!is_single_shot_mode(&args));
    }

    #[test]
    fn test_delay_flags_conflict() {
        assert!(Args::try_parse_from(["scorewatch", "--delay", "--no-delay"]).is_err());
    }
}
