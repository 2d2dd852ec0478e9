use super::models::Calendar;
use crate::error::{BoardResult, Error};
use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::info;

struct CachedCalendars {
    calendars: Vec<Calendar>,
    fetched_at: Instant,
}

/// Calendar name to id lookup, filled from one "list calendars" request.
///
/// The lock is held across the upstream fetch so concurrent first callers
/// share a single request. Entries live until `invalidate` is called or the
/// optional TTL passes.
pub struct CalendarIdCache {
    ttl: Option<Duration>,
    entry: Mutex<Option<CachedCalendars>>,
}

impl CalendarIdCache {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            ttl,
            entry: Mutex::new(None),
        }
    }

    /// Resolve `name` to its calendar id, calling `fetch` when the cache is empty or stale
    pub async fn resolve<F, Fut>(&self, name: &str, fetch: F) -> BoardResult<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = BoardResult<Vec<Calendar>>>,
    {
        let mut entry = self.entry.lock().await;

        if let Some(reason) = self.refetch_reason(entry.as_ref()) {
            let calendars = fetch().await?;
            info!(count = calendars.len(), reason, "Fetched calendars");
            *entry = Some(CachedCalendars {
                calendars,
                fetched_at: Instant::now(),
            });
        }

        match entry.as_ref() {
            Some(cached) => find_single(&cached.calendars, name),
            None => Err(Error::CalendarNotFound(name.to_string())),
        }
    }

    /// Why the cached entry cannot be used, if it cannot
    fn refetch_reason(&self, entry: Option<&CachedCalendars>) -> Option<&'static str> {
        match (entry, self.ttl) {
            (None, _) => Some("empty"),
            (Some(cached), Some(ttl)) if cached.fetched_at.elapsed() >= ttl => Some("expired"),
            (Some(_), _) => None,
        }
    }

    /// Drop cached calendars so the next lookup fetches again
    pub async fn invalidate(&self) {
        *self.entry.lock().await = None;
    }

    pub async fn is_populated(&self) -> bool {
        self.entry.lock().await.is_some()
    }
}

impl Default for CalendarIdCache {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Exactly one calendar must carry `name`
fn find_single(calendars: &[Calendar], name: &str) -> BoardResult<String> {
    let mut matches = calendars.iter().filter(|c| c.name == name);
    match (matches.next(), matches.count()) {
        (None, _) => Err(Error::CalendarNotFound(name.to_string())),
        (Some(calendar), 0) => Ok(calendar.id.clone()),
        (Some(_), extra) => Err(Error::AmbiguousCalendar {
            name: name.to_string(),
            count: extra + 1,
        }),
    }
}
