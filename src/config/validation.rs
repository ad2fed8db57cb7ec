use crate::error::AppError;
use std::path::Path;

use crate::config::Config;

/// Validates the configuration settings
///
/// # Validation Rules
/// - At least one team must be configured
/// - Base URLs must look like URLs
/// - The live interval must be shorter than the idle interval
/// - If a log file path is provided, its parent directory must exist or be
///   creatable
pub fn validate_config(config: &Config) -> Result<(), AppError> {
    if config.teams.is_empty() {
        return Err(AppError::config_error(
            "At least one team must be configured",
        ));
    }

    for team in &config.teams {
        if team.display_name.trim().is_empty() {
            return Err(AppError::config_error("Team name cannot be empty"));
        }
    }

    for (label, url) in [
        ("espn_base_url", &config.espn_base_url),
        ("mlb_base_url", &config.mlb_base_url),
        ("nhl_base_url", &config.nhl_base_url),
        ("nba_base_url", &config.nba_base_url),
    ] {
        validate_base_url(label, url)?;
    }

    if config.live_interval_seconds == 0 || config.idle_interval_seconds == 0 {
        return Err(AppError::config_error(
            "Refresh intervals must be greater than zero",
        ));
    }
    if config.live_interval_seconds > config.idle_interval_seconds {
        return Err(AppError::config_error(
            "Live refresh interval must not exceed the idle interval",
        ));
    }

    if config.delay_seconds == 0 && config.delay_enabled {
        return Err(AppError::config_error(
            "Delay mode requires delay_seconds greater than zero",
        ));
    }

    // Validate log file path if provided
    if let Some(log_path) = &config.log_file_path {
        if log_path.is_empty() {
            return Err(AppError::config_error("Log file path cannot be empty"));
        }

        // Check if parent directory exists or can be created
        if let Some(parent) = Path::new(log_path).parent()
            && !parent.exists()
        {
            // Try to create the directory to validate the path
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::config_error(format!(
                    "Cannot create log directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    Ok(())
}

fn validate_base_url(label: &str, url: &str) -> Result<(), AppError> {
    if url.is_empty() {
        return Err(AppError::config_error(format!("{label} cannot be empty")));
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(AppError::config_error(format!(
            "{label} must start with http:// or https://"
        )));
    }
    Ok(())
}
