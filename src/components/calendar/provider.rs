use super::models::{Calendar, EventPage};
use super::time::QueryWindow;
use crate::error::BoardResult;
use async_trait::async_trait;

/// Upstream calendar service seen by the manager
#[async_trait]
pub trait CalendarProvider: Send + Sync {
    /// List every calendar visible to the signed-in account, in one request
    async fn list_calendars(&self) -> BoardResult<Vec<Calendar>>;

    /// Fetch one page of events in `window`.
    ///
    /// `page` is `None` for the first page and the previous page's
    /// continuation link afterwards.
    async fn list_events(
        &self,
        calendar_id: &str,
        window: &QueryWindow,
        page: Option<&str>,
    ) -> BoardResult<EventPage>;
}
