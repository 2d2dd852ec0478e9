use super::models::{Calendar, CalendarEvent, EventPage};
use super::provider::CalendarProvider;
use super::time::QueryWindow;
use super::token::TokenSource;
use crate::error::{config_error, BoardResult, Error};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

pub const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";
const OUTLOOK_TIMEZONE_HEADER: &str = r#"outlook.timezone="UTC""#;

#[derive(Debug, Deserialize)]
struct GraphCollection<T> {
    value: Vec<T>,
    #[serde(rename = "@odata.nextLink", default)]
    next_link: Option<String>,
}

/// Microsoft Graph calendar provider
#[derive(Clone)]
pub struct GraphCalendarProvider {
    client: Client,
    base_url: Url,
    tokens: Arc<dyn TokenSource>,
}

impl GraphCalendarProvider {
    pub fn new(client: Client, base_url: &str, tokens: Arc<dyn TokenSource>) -> BoardResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| config_error(&format!("Invalid Graph base URL '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(config_error(&format!("Graph base URL '{}' cannot be a base", base_url)));
        }
        Ok(Self {
            client,
            base_url,
            tokens,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> BoardResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| config_error("Graph base URL cannot be a base"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Parse a `@odata.nextLink`; the bearer token is only sent back to the base URL's origin
    fn continuation(&self, link: &str) -> BoardResult<Url> {
        let url = Url::parse(link)
            .map_err(|e| Error::Other(format!("Invalid continuation link '{}': {}", link, e)))?;
        if url.origin() != self.base_url.origin() {
            warn!(link, "Continuation link points outside the Graph base URL");
            return Err(Error::Other(format!(
                "Continuation link '{}' is not on {}",
                link,
                self.base_url.origin().ascii_serialization()
            )));
        }
        Ok(url)
    }

    async fn send(&self, url: Url, token: &str) -> BoardResult<reqwest::Response> {
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .header("Prefer", OUTLOOK_TIMEZONE_HEADER)
            .send()
            .await?;
        Ok(response)
    }

    /// GET a Graph resource, refreshing the token and retrying once on 401
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> BoardResult<T> {
        let token = self.tokens.access_token().await?;
        let mut response = self.send(url.clone(), &token).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            warn!(path = url.path(), "Graph rejected the access token, refreshing");
            let token = self.tokens.refresh().await?;
            response = self.send(url, &token).await?;
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(Error::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl CalendarProvider for GraphCalendarProvider {
    async fn list_calendars(&self) -> BoardResult<Vec<Calendar>> {
        let url = self.endpoint(&["me", "calendars"])?;
        let collection: GraphCollection<Calendar> = self.get_json(url).await?;
        if collection.next_link.is_some() {
            debug!("Calendar list has further pages; only the first page is used");
        }
        Ok(collection.value)
    }

    async fn list_events(
        &self,
        calendar_id: &str,
        window: &QueryWindow,
        page: Option<&str>,
    ) -> BoardResult<EventPage> {
        let url = match page {
            // Continuation links already carry the window and cursor
            Some(link) => self.continuation(link)?,
            None => {
                let mut url = self.endpoint(&["me", "calendars", calendar_id, "calendarView"])?;
                url.query_pairs_mut()
                    .append_pair("startDateTime", &window.start_param())
                    .append_pair("endDateTime", &window.end_param());
                url
            }
        };

        let collection: GraphCollection<CalendarEvent> = self.get_json(url).await?;
        Ok(EventPage {
            events: collection.value,
            next_page: collection.next_link,
        })
    }
}
