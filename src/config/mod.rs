use crate::constants;
use crate::data_fetcher::models::TeamDescriptor;
use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;

pub mod paths;
pub mod validation;

use paths::{get_config_path, get_log_dir_path};
use validation::validate_config;

/// Configuration structure for the application.
/// Handles loading, saving, and managing application settings.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Teams to poll, in display order
    #[serde(default)]
    pub teams: Vec<TeamDescriptor>,
    /// Fetch interval while any team is playing (seconds)
    #[serde(default = "default_live_interval")]
    pub live_interval_seconds: u64,
    /// Fetch interval when no team is playing (seconds)
    #[serde(default = "default_idle_interval")]
    pub idle_interval_seconds: u64,
    /// Whether the broadcast delay starts enabled
    #[serde(default)]
    pub delay_enabled: bool,
    /// Broadcast delay length (seconds)
    #[serde(default = "default_delay_seconds")]
    pub delay_seconds: u64,
    /// HTTP timeout in seconds for API requests. Defaults to 30 seconds if not specified.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_seconds: u64,
    /// Path to the log file. If not specified, logs will be written to a default location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file_path: Option<String>,
    /// Upstream base URLs; overridable for tests and mirrors
    #[serde(default = "default_espn_base")]
    pub espn_base_url: String,
    #[serde(default = "default_mlb_base")]
    pub mlb_base_url: String,
    #[serde(default = "default_nhl_base")]
    pub nhl_base_url: String,
    #[serde(default = "default_nba_base")]
    pub nba_base_url: String,
}

fn default_live_interval() -> u64 {
    constants::refresh::LIVE_INTERVAL_SECONDS
}

fn default_idle_interval() -> u64 {
    constants::refresh::IDLE_INTERVAL_SECONDS
}

fn default_delay_seconds() -> u64 {
    constants::delay::DEFAULT_DELAY_SECONDS
}

fn default_http_timeout() -> u64 {
    constants::DEFAULT_HTTP_TIMEOUT_SECONDS
}

fn default_espn_base() -> String {
    crate::data_fetcher::api::urls::ESPN_DEFAULT_BASE.to_string()
}

fn default_mlb_base() -> String {
    crate::data_fetcher::api::urls::MLB_DEFAULT_BASE.to_string()
}

fn default_nhl_base() -> String {
    crate::data_fetcher::api::urls::NHL_DEFAULT_BASE.to_string()
}

fn default_nba_base() -> String {
    crate::data_fetcher::api::urls::NBA_DEFAULT_BASE.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            teams: Vec::new(),
            live_interval_seconds: default_live_interval(),
            idle_interval_seconds: default_idle_interval(),
            delay_enabled: false,
            delay_seconds: default_delay_seconds(),
            http_timeout_seconds: default_http_timeout(),
            log_file_path: None,
            espn_base_url: default_espn_base(),
            mlb_base_url: default_mlb_base(),
            nhl_base_url: default_nhl_base(),
            nba_base_url: default_nba_base(),
        }
    }
}

impl Config {
    /// Loads configuration from the default config file location.
    /// Environment variables can override config file values.
    ///
    /// # Environment Variables
    /// - `SCOREWATCH_ESPN_BASE_URL` / `_MLB_` / `_NHL_` / `_NBA_` - Override upstream base URLs
    /// - `SCOREWATCH_LOG_FILE` - Override log file path
    /// - `SCOREWATCH_HTTP_TIMEOUT` - Override HTTP timeout in seconds
    ///
    /// # Notes
    /// - Config file is stored in platform-specific config directory
    /// - A missing file yields the defaults (teams are then supplied on the
    ///   command line)
    /// - Environment variables take precedence over the config file
    pub async fn load() -> Result<Self, AppError> {
        let config_path = get_config_path();

        let mut config = if Path::new(&config_path).exists() {
            let content = fs::read_to_string(&config_path).await?;
            toml::from_str(&content)?
        } else {
            Config::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(base) = std::env::var(constants::env_vars::ESPN_BASE_URL) {
            self.espn_base_url = base;
        }
        if let Ok(base) = std::env::var(constants::env_vars::MLB_BASE_URL) {
            self.mlb_base_url = base;
        }
        if let Ok(base) = std::env::var(constants::env_vars::NHL_BASE_URL) {
            self.nhl_base_url = base;
        }
        if let Ok(base) = std::env::var(constants::env_vars::NBA_BASE_URL) {
            self.nba_base_url = base;
        }
        if let Ok(log_file_path) = std::env::var(constants::env_vars::LOG_FILE) {
            self.log_file_path = Some(log_file_path);
        }
        if let Some(timeout) = std::env::var(constants::env_vars::HTTP_TIMEOUT)
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            self.http_timeout_seconds = timeout;
        }
    }

    /// Validates the configuration settings
    pub fn validate(&self) -> Result<(), AppError> {
        validate_config(self)
    }

    /// Saves current configuration to the default config file location.
    pub async fn save(&self) -> Result<(), AppError> {
        let config_path = get_config_path();
        self.save_to_path(&config_path).await
    }

    /// Returns the platform-specific path for the config file.
    pub fn get_config_path() -> String {
        paths::get_config_path()
    }

    /// Returns the platform-specific path for the log directory.
    pub fn get_log_dir_path() -> String {
        paths::get_log_dir_path()
    }

    /// Displays current configuration settings to stdout.
    pub async fn display() -> Result<(), AppError> {
        let config_path = get_config_path();
        let log_dir = get_log_dir_path();

        if Path::new(&config_path).exists() {
            let config = Config::load().await?;
            println!("\nCurrent Configuration");
            println!("────────────────────────────────────");
            println!("Config Location:");
            println!("{config_path}");
            println!("────────────────────────────────────");
            println!("Teams:");
            if config.teams.is_empty() {
                println!("(none configured)");
            }
            for team in &config.teams {
                println!("{} [{}]", team.display_name, team.league);
            }
            println!("────────────────────────────────────");
            println!("Refresh Intervals:");
            println!(
                "{}s live / {}s idle",
                config.live_interval_seconds, config.idle_interval_seconds
            );
            println!("────────────────────────────────────");
            println!("Broadcast Delay:");
            if config.delay_enabled {
                println!("enabled, {} seconds", config.delay_seconds);
            } else {
                println!("disabled ({} seconds when enabled)", config.delay_seconds);
            }
            println!("────────────────────────────────────");
            println!("HTTP Timeout:");
            println!("{} seconds", config.http_timeout_seconds);
            println!("────────────────────────────────────");
            println!("Log File Location:");
            if let Some(custom_path) = &config.log_file_path {
                println!("{custom_path}");
            } else {
                println!("{log_dir}/scorewatch.log");
                println!("(Default location)");
            }
        } else {
            println!("\nNo configuration file found at:");
            println!("{config_path}");
        }

        Ok(())
    }

    /// Saves configuration to a custom file path.
    ///
    /// Creates the parent directory if it doesn't exist.
    pub async fn save_to_path(&self, path: &str) -> Result<(), AppError> {
        let config_dir = Path::new(path).parent().ok_or_else(|| {
            AppError::config_error(format!("Path '{path}' has no parent directory"))
        })?;

        if !config_dir.exists() {
            fs::create_dir_all(config_dir).await?;
        }
        let content = toml::to_string_pretty(self)?;
        let mut file = fs::File::create(path).await?;
        file.write_all(content.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    /// Loads configuration from a custom file path (for testing).
    #[allow(dead_code)] // Used in tests
    pub async fn load_from_path(path: &str) -> Result<Self, AppError> {
        let content = fs::read_to_string(path).await?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
