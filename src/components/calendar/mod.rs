mod cache;
pub mod graph;
mod manager;
pub mod models;
mod provider;
pub mod time;
pub mod token;

pub use cache::CalendarIdCache;
pub use graph::GraphCalendarProvider;
pub use manager::CalendarManager;
pub use models::{Calendar, CalendarEvent, EventPage, EventsOutcome};
pub use provider::CalendarProvider;
pub use time::{BoardTimeZone, QueryWindow};
pub use token::{RefreshCredentials, RefreshingToken, StaticToken, TokenSource};

use crate::config::Config;
use crate::error::BoardResult;
use reqwest::Client;
use std::sync::Arc;

/// Build a manager talking to Microsoft Graph from the loaded configuration
pub fn manager_from_config(config: &Config) -> BoardResult<CalendarManager> {
    let client = Client::new();

    let tokens: Arc<dyn TokenSource> = match config.refresh_credentials() {
        Some(credentials) => Arc::new(RefreshingToken::new(
            client.clone(),
            config.graph_access_token.clone(),
            credentials,
        )),
        None => Arc::new(StaticToken::new(config.graph_access_token.clone())),
    };

    let provider = GraphCalendarProvider::new(client, &config.graph_base_url, tokens)?;
    Ok(CalendarManager::with_cache_ttl(
        Arc::new(provider),
        config.board_timezone()?,
        config.cache_ttl(),
    ))
}
