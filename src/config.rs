use crate::components::board::parse_weekday;
use crate::components::calendar::graph::DEFAULT_GRAPH_BASE_URL;
use crate::components::calendar::token::DEFAULT_TOKEN_URL;
use crate::components::calendar::{BoardTimeZone, RefreshCredentials};
use crate::error::{config_error, env_error, BoardResult};
use chrono::Weekday;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Optional settings file, read before the environment
pub const CONFIG_FILE: &str = "config/familyboard.toml";

/// Default first column of the month grid
pub const DEFAULT_FIRST_WEEKDAY: &str = "sunday";

/// Values that may come from `config/familyboard.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileSettings {
    pub calendar_name: Option<String>,
    pub timezone: Option<String>,
    pub first_weekday: Option<String>,
    pub calendar_cache_ttl_secs: Option<u64>,
    pub graph_base_url: Option<String>,
}

impl FileSettings {
    /// Read the settings file, or defaults when it does not exist
    pub fn load(path: &Path) -> BoardResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}

/// Main configuration structure for the board
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Pre-authorized Graph access token
    pub graph_access_token: String,
    /// Refresh token used when Graph rejects the access token
    pub graph_refresh_token: Option<String>,
    /// App registration client ID
    pub graph_client_id: Option<String>,
    /// App registration client secret
    pub graph_client_secret: Option<String>,
    /// Token endpoint for the refresh grant
    pub graph_token_url: String,
    /// Graph API root
    pub graph_base_url: String,
    /// Display name of the calendar shown on the board
    pub calendar_name: String,
    /// `Local` or an IANA timezone name
    pub timezone: String,
    /// First column of the month grid
    pub first_weekday: String,
    /// Lifetime of the calendar id cache; unset keeps it for the whole process
    pub calendar_cache_ttl_secs: Option<u64>,
}

impl Config {
    /// Load configuration from `.env`, the settings file, and the environment
    pub fn load() -> BoardResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let file = FileSettings::load(Path::new(CONFIG_FILE))?;
        Self::from_sources(file, |key| env::var(key).ok())
    }

    /// Combine file settings with variables from `lookup`; variables win
    pub fn from_sources<F>(file: FileSettings, lookup: F) -> BoardResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let graph_access_token =
            var("GRAPH_ACCESS_TOKEN").ok_or_else(|| env_error("GRAPH_ACCESS_TOKEN"))?;

        let calendar_name = var("BOARD_CALENDAR_NAME")
            .or(file.calendar_name)
            .ok_or_else(|| env_error("BOARD_CALENDAR_NAME"))?;

        let calendar_cache_ttl_secs = match var("CALENDAR_CACHE_TTL_SECS") {
            Some(raw) => Some(raw.trim().parse::<u64>().map_err(|_| {
                config_error(&format!("Invalid CALENDAR_CACHE_TTL_SECS format: {}", raw))
            })?),
            None => file.calendar_cache_ttl_secs,
        };

        let config = Config {
            graph_access_token,
            graph_refresh_token: var("GRAPH_REFRESH_TOKEN"),
            graph_client_id: var("GRAPH_CLIENT_ID"),
            graph_client_secret: var("GRAPH_CLIENT_SECRET"),
            graph_token_url: var("GRAPH_TOKEN_URL")
                .unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
            graph_base_url: var("GRAPH_BASE_URL")
                .or(file.graph_base_url)
                .unwrap_or_else(|| DEFAULT_GRAPH_BASE_URL.to_string()),
            calendar_name,
            timezone: var("TIMEZONE")
                .or(file.timezone)
                .unwrap_or_else(|| String::from("Local")),
            first_weekday: var("BOARD_FIRST_WEEKDAY")
                .or(file.first_weekday)
                .unwrap_or_else(|| String::from(DEFAULT_FIRST_WEEKDAY)),
            calendar_cache_ttl_secs,
        };

        // Fail at startup rather than on the first fetch
        config.board_timezone()?;
        config.week_start()?;

        Ok(config)
    }

    pub fn board_timezone(&self) -> BoardResult<BoardTimeZone> {
        BoardTimeZone::parse(&self.timezone)
    }

    pub fn week_start(&self) -> BoardResult<Weekday> {
        parse_weekday(&self.first_weekday).ok_or_else(|| {
            config_error(&format!("Invalid BOARD_FIRST_WEEKDAY: {}", self.first_weekday))
        })
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        self.calendar_cache_ttl_secs.map(Duration::from_secs)
    }

    /// Refresh-grant credentials, when all three parts are configured
    pub fn refresh_credentials(&self) -> Option<RefreshCredentials> {
        match (
            &self.graph_refresh_token,
            &self.graph_client_id,
            &self.graph_client_secret,
        ) {
            (Some(refresh_token), Some(client_id), Some(client_secret)) => Some(RefreshCredentials {
                token_url: self.graph_token_url.clone(),
                client_id: client_id.clone(),
                client_secret: client_secret.clone(),
                refresh_token: refresh_token.clone(),
            }),
            _ => None,
        }
    }
}
