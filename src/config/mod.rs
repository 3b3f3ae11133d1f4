//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::models::{AliasEntry, AliasMode, NameAliasMap, Scope};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Remote API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the Lichess API host
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_base_url() -> String {
    "https://lichess.org".to_string()
}

fn default_user_agent() -> String {
    concat!("club-arena/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Which club and organizer to track.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClubConfig {
    /// Lichess team identifier
    #[serde(default = "default_club")]
    pub club: String,

    /// Account whose tournaments are tracked
    #[serde(default = "default_organizer")]
    pub organizer: String,

    /// Maximum number of arenas requested from the team listing
    #[serde(default = "default_max_tournaments")]
    pub max_tournaments: u32,

    /// Years that get their own leaderboard
    #[serde(default = "default_tracked_years")]
    pub tracked_years: Vec<i32>,
}

fn default_club() -> String {
    "sc-weisse-dame-ev".to_string()
}

fn default_organizer() -> String {
    "jeffforever".to_string()
}

fn default_max_tournaments() -> u32 {
    500
}

fn default_tracked_years() -> Vec<i32> {
    vec![2020, 2021, 2022]
}

impl Default for ClubConfig {
    fn default() -> Self {
        Self {
            club: default_club(),
            organizer: default_organizer(),
            max_tournaments: default_max_tournaments(),
            tracked_years: default_tracked_years(),
        }
    }
}

impl ClubConfig {
    /// All scopes to aggregate: all-time first, then each tracked year.
    pub fn scopes(&self) -> Vec<Scope> {
        std::iter::once(Scope::AllTime)
            .chain(self.tracked_years.iter().copied().map(Scope::Year))
            .collect()
    }
}

/// Chart configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartConfig {
    /// League value used when a tournament name carries no league digit
    #[serde(default = "default_league_fallback")]
    pub league_fallback: u32,

    /// Bars in the leaderboard chart
    #[serde(default = "default_top_players")]
    pub top_players: usize,
}

fn default_league_fallback() -> u32 {
    4
}

fn default_top_players() -> usize {
    10
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            league_fallback: default_league_fallback(),
            top_players: default_top_players(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub alias_mode: AliasMode,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub club: ClubConfig,

    #[serde(default)]
    pub chart: ChartConfig,

    /// Alternate accounts, applied in order
    #[serde(default)]
    pub aliases: Vec<AliasEntry>,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            alias_mode: AliasMode::default(),
            api: ApiConfig::default(),
            club: ClubConfig::default(),
            chart: ChartConfig::default(),
            aliases: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the file if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Alias table built from the configured entries.
    pub fn alias_map(&self) -> NameAliasMap {
        NameAliasMap::new(self.aliases.clone(), self.alias_mode)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.club.club.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Club identifier must not be empty".to_string(),
            ));
        }

        if self.club.organizer.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Organizer must not be empty".to_string(),
            ));
        }

        if self.club.max_tournaments == 0 {
            return Err(ConfigError::ValidationError(
                "max_tournaments must be greater than 0".to_string(),
            ));
        }

        if self.api.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "API timeout must be greater than 0".to_string(),
            ));
        }

        if let Some(entry) = self.aliases.iter().find(|a| a.from.is_empty()) {
            return Err(ConfigError::ValidationError(format!(
                "Alias for '{}' has an empty source name",
                entry.to
            )));
        }

        Ok(())
    }
}
