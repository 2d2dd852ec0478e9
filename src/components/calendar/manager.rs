use super::cache::CalendarIdCache;
use super::models::{CalendarEvent, EventsOutcome};
use super::provider::CalendarProvider;
use super::time::{month_range, BoardTimeZone, QueryWindow};
use crate::error::{BoardResult, Error};
use chrono::NaiveDate;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Fetches the board's events from the calendar provider.
///
/// Meant to be created once and shared for the life of the process; the
/// calendar id cache lives on the instance.
pub struct CalendarManager {
    provider: Arc<dyn CalendarProvider>,
    timezone: BoardTimeZone,
    calendar_ids: CalendarIdCache,
}

impl CalendarManager {
    pub fn new(provider: Arc<dyn CalendarProvider>, timezone: BoardTimeZone) -> Self {
        Self::with_cache_ttl(provider, timezone, None)
    }

    pub fn with_cache_ttl(
        provider: Arc<dyn CalendarProvider>,
        timezone: BoardTimeZone,
        cache_ttl: Option<Duration>,
    ) -> Self {
        Self {
            provider,
            timezone,
            calendar_ids: CalendarIdCache::new(cache_ttl),
        }
    }

    pub fn timezone(&self) -> BoardTimeZone {
        self.timezone
    }

    /// Resolve a calendar display name to its provider id.
    ///
    /// The first call lists all calendars and caches them. The name must
    /// match exactly one calendar.
    pub async fn resolve_calendar_id(
        &self,
        calendar_name: &str,
        cancel: &CancellationToken,
    ) -> BoardResult<String> {
        let provider = Arc::clone(&self.provider);
        let lookup = self
            .calendar_ids
            .resolve(calendar_name, || async move { provider.list_calendars().await });
        until_cancelled(cancel, lookup).await
    }

    /// Absolute window covering the local days `start` through `end`
    pub fn query_window(&self, start: NaiveDate, end: NaiveDate) -> BoardResult<QueryWindow> {
        QueryWindow::for_dates(&self.timezone, start, end)
    }

    /// Events from the start of `start` through the end of `end`, in provider order.
    ///
    /// Failures are logged here and reported as `EventsOutcome::Failed`; only
    /// cancellation comes back as an error.
    pub async fn get_events_between_dates(
        &self,
        calendar_name: &str,
        start: NaiveDate,
        end: NaiveDate,
        cancel: &CancellationToken,
    ) -> BoardResult<EventsOutcome> {
        match self.fetch_events(calendar_name, start, end, cancel).await {
            Ok(events) => {
                info!(
                    calendar = calendar_name,
                    %start,
                    %end,
                    event_count = events.len(),
                    "get_events_between_dates success"
                );
                Ok(EventsOutcome::from_events(events))
            }
            Err(Error::Cancelled) => {
                debug!(calendar = calendar_name, "get_events_between_dates cancelled");
                Err(Error::Cancelled)
            }
            Err(e) => {
                error!(
                    calendar = calendar_name,
                    %start,
                    %end,
                    error = %e,
                    "get_events_between_dates failed"
                );
                Ok(EventsOutcome::Failed {
                    reason: e.to_string(),
                })
            }
        }
    }

    /// All events in the month containing `date`
    pub async fn get_months_events(
        &self,
        calendar_name: &str,
        date: NaiveDate,
        cancel: &CancellationToken,
    ) -> BoardResult<EventsOutcome> {
        let (first, last) = match month_range(date) {
            Ok(range) => range,
            Err(e) => {
                error!(calendar = calendar_name, %date, error = %e, "get_months_events failed");
                return Ok(EventsOutcome::Failed {
                    reason: e.to_string(),
                });
            }
        };
        self.get_events_between_dates(calendar_name, first, last, cancel)
            .await
    }

    /// Forget cached calendar ids, e.g. after calendars were renamed
    pub async fn invalidate_calendar_cache(&self) {
        self.calendar_ids.invalidate().await;
    }

    async fn fetch_events(
        &self,
        calendar_name: &str,
        start: NaiveDate,
        end: NaiveDate,
        cancel: &CancellationToken,
    ) -> BoardResult<Vec<CalendarEvent>> {
        let window = self.query_window(start, end)?;
        let calendar_id = self.resolve_calendar_id(calendar_name, cancel).await?;

        debug!(
            calendar_id = %calendar_id,
            start = %window.start_param(),
            end = %window.end_param(),
            "Querying calendar view"
        );

        let mut page = until_cancelled(
            cancel,
            self.provider.list_events(&calendar_id, &window, None),
        )
        .await?;
        let mut events = std::mem::take(&mut page.events);
        let mut pages = 1;

        while let Some(next) = page.next_page.take() {
            page = until_cancelled(
                cancel,
                self.provider.list_events(&calendar_id, &window, Some(&next)),
            )
            .await?;
            events.append(&mut page.events);
            pages += 1;
        }

        debug!(calendar_id = %calendar_id, pages, "Calendar view exhausted");
        Ok(events)
    }
}

/// Run `fut` unless `cancel` fires first; the losing future is dropped
async fn until_cancelled<T, F>(cancel: &CancellationToken, fut: F) -> BoardResult<T>
where
    F: Future<Output = BoardResult<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        result = fut => result,
    }
}
