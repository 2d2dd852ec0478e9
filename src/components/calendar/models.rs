use super::time::{parse_graph_date_time, BoardTimeZone};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A calendar visible to the signed-in account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calendar {
    pub id: String,
    pub name: String,
}

/// Date and time as Graph reports it, wall clock plus zone name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EventDateTime {
    #[serde(rename = "dateTime")]
    pub date_time: String,
    #[serde(rename = "timeZone", default)]
    pub time_zone: Option<String>,
}

/// Calendar event as the provider returned it.
///
/// Only the fields the board places on the grid are typed; everything else
/// (location, organizer, attendees, ...) is carried untouched in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CalendarEvent {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(rename = "bodyPreview", default)]
    pub body_preview: Option<String>,
    #[serde(default)]
    pub start: Option<EventDateTime>,
    #[serde(default)]
    pub end: Option<EventDateTime>,
    #[serde(rename = "isAllDay", default)]
    pub is_all_day: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CalendarEvent {
    /// Board-local date the event starts on.
    ///
    /// All-day events carry a floating midnight, so their date is taken as
    /// written. Timed events are converted from their reported zone (UTC when
    /// absent or unknown) into the board's zone.
    pub fn start_date(&self, board_tz: &BoardTimeZone) -> Option<NaiveDate> {
        if self.is_all_day {
            let start = self.start.as_ref()?;
            return parse_graph_date_time(&start.date_time).ok().map(|n| n.date());
        }
        self.start_instant().map(|instant| board_tz.date_of(instant))
    }

    /// Start time formatted `HH:MM` in the board's zone, `None` for all-day events
    pub fn start_time_label(&self, board_tz: &BoardTimeZone) -> Option<String> {
        if self.is_all_day {
            return None;
        }
        let instant = self.start_instant()?;
        let label = match board_tz {
            BoardTimeZone::Local => instant.with_timezone(&chrono::Local).format("%H:%M"),
            BoardTimeZone::Named(tz) => instant.with_timezone(tz).format("%H:%M"),
        };
        Some(label.to_string())
    }

    fn start_instant(&self) -> Option<DateTime<Utc>> {
        let start = self.start.as_ref()?;
        let naive = parse_graph_date_time(&start.date_time).ok()?;
        match start.time_zone.as_deref().and_then(|z| z.parse::<Tz>().ok()) {
            Some(tz) => naive
                .and_local_timezone(tz)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc)),
            None => Some(naive.and_utc()),
        }
    }
}

/// One page of a calendar view query
#[derive(Debug, Clone, Default)]
pub struct EventPage {
    pub events: Vec<CalendarEvent>,
    /// Continuation link, present while more results remain
    pub next_page: Option<String>,
}

/// Result of an event query as seen by the board.
///
/// Failures are kept apart from "nothing in range" so callers can tell them
/// apart; `into_events` gives the flattened view the grid renders.
#[derive(Debug, Clone, PartialEq)]
pub enum EventsOutcome {
    Events(Vec<CalendarEvent>),
    Empty,
    Failed { reason: String },
}

impl EventsOutcome {
    pub fn from_events(events: Vec<CalendarEvent>) -> Self {
        if events.is_empty() {
            Self::Empty
        } else {
            Self::Events(events)
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Events(events) => events.len(),
            Self::Empty | Self::Failed { .. } => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Events in provider order; empty for both `Empty` and `Failed`
    pub fn into_events(self) -> Vec<CalendarEvent> {
        match self {
            Self::Events(events) => events,
            Self::Empty | Self::Failed { .. } => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timed(date_time: &str, zone: Option<&str>) -> CalendarEvent {
        CalendarEvent {
            id: "e".to_string(),
            start: Some(EventDateTime {
                date_time: date_time.to_string(),
                time_zone: zone.map(str::to_string),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_deserialize_graph_event() {
        let json = serde_json::json!({
            "id": "AAMk1",
            "subject": "Swimming",
            "bodyPreview": "",
            "isAllDay": false,
            "start": { "dateTime": "2021-02-03T16:00:00.0000000", "timeZone": "UTC" },
            "end": { "dateTime": "2021-02-03T17:00:00.0000000", "timeZone": "UTC" },
            "organizer": { "emailAddress": { "name": "Mum" } }
        });
        let event: CalendarEvent = serde_json::from_value(json).unwrap();
        assert_eq!(event.subject.as_deref(), Some("Swimming"));
        assert_eq!(event.start.unwrap().time_zone.as_deref(), Some("UTC"));
    }

    #[test]
    fn test_untyped_fields_survive_round_trip() {
        let json = serde_json::json!({
            "id": "AAMk2",
            "subject": "Dentist",
            "start": { "dateTime": "2021-02-05T09:00:00.0000000", "timeZone": "UTC" },
            "location": { "displayName": "Main Street 4" },
            "organizer": { "emailAddress": { "name": "Dad" } },
            "attendees": []
        });
        let event: CalendarEvent = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(event.extra["location"]["displayName"], "Main Street 4");
        assert!(!event.extra.contains_key("subject"));

        let back = serde_json::to_value(&event).unwrap();
        assert_eq!(back["location"], json["location"]);
        assert_eq!(back["organizer"], json["organizer"]);
        assert_eq!(back["attendees"], json["attendees"]);
        assert_eq!(back["subject"], "Dentist");
    }

    #[test]
    fn test_event_without_id_still_deserializes() {
        let json = serde_json::json!({
            "subject": "Draft",
            "start": { "dateTime": "2021-02-05T09:00:00.0000000", "timeZone": "UTC" }
        });
        let event: CalendarEvent = serde_json::from_value(json).unwrap();
        assert_eq!(event.id, "");
        assert_eq!(event.subject.as_deref(), Some("Draft"));
    }

    #[test]
    fn test_start_date_converts_to_board_zone() {
        let tz = BoardTimeZone::Named(chrono_tz::Europe::Helsinki);
        let late = timed("2021-02-03T22:30:00.0000000", Some("UTC"));
        assert_eq!(late.start_date(&tz), NaiveDate::from_ymd_opt(2021, 2, 4));
        assert_eq!(late.start_time_label(&tz).as_deref(), Some("00:30"));

        let unknown_zone = timed("2021-02-03T10:00:00.0000000", Some("FLE Standard Time"));
        assert_eq!(unknown_zone.start_date(&tz), NaiveDate::from_ymd_opt(2021, 2, 3));
    }

    #[test]
    fn test_all_day_keeps_written_date() {
        let tz = BoardTimeZone::Named(chrono_tz::America::New_York);
        let mut event = timed("2021-02-03T00:00:00.0000000", Some("UTC"));
        event.is_all_day = true;
        assert_eq!(event.start_date(&tz), NaiveDate::from_ymd_opt(2021, 2, 3));
        assert_eq!(event.start_time_label(&tz), None);
    }

    #[test]
    fn test_outcome_views() {
        assert_eq!(EventsOutcome::from_events(Vec::new()), EventsOutcome::Empty);
        let failed = EventsOutcome::Failed { reason: "boom".to_string() };
        assert!(failed.is_failure());
        assert!(failed.into_events().is_empty());
        let found = EventsOutcome::from_events(vec![CalendarEvent::default()]);
        assert_eq!(found.len(), 1);
    }
}
