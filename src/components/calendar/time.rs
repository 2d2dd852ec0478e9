use crate::error::{time_error, BoardResult, Error};
use chrono::{
    DateTime, Datelike, Duration, Local, LocalResult, NaiveDate, NaiveDateTime, NaiveTime,
    SecondsFormat, TimeZone, Utc,
};
use chrono_tz::Tz;

/// Forward steps tried when local midnight falls inside a DST gap
const MAX_GAP_STEPS: u32 = 16;
const GAP_STEP_MINUTES: i64 = 15;

/// Timezone the board interprets bare calendar dates in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoardTimeZone {
    /// The host machine's timezone
    #[default]
    Local,
    /// A fixed IANA zone, independent of the host
    Named(Tz),
}

impl BoardTimeZone {
    /// Parse `Local` (or an empty string) or an IANA zone name such as `Europe/Helsinki`
    pub fn parse(value: &str) -> BoardResult<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("local") {
            return Ok(Self::Local);
        }
        trimmed
            .parse::<Tz>()
            .map(Self::Named)
            .map_err(|_| time_error(&format!("Unknown timezone: {}", trimmed)))
    }

    /// First instant of `date` in this zone
    pub fn start_of_day(&self, date: NaiveDate) -> BoardResult<DateTime<Utc>> {
        let midnight = date.and_time(NaiveTime::MIN);
        match self {
            Self::Local => resolve_wall_clock(&Local, midnight),
            Self::Named(tz) => resolve_wall_clock(tz, midnight),
        }
    }

    /// Last instant of `date` in this zone, one nanosecond before the next local midnight
    pub fn end_of_day(&self, date: NaiveDate) -> BoardResult<DateTime<Utc>> {
        let next = date
            .succ_opt()
            .ok_or_else(|| time_error(&format!("No day after {}", date)))?;
        Ok(self.start_of_day(next)? - Duration::nanoseconds(1))
    }

    /// Calendar date of an instant in this zone
    pub fn date_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        match self {
            Self::Local => instant.with_timezone(&Local).date_naive(),
            Self::Named(tz) => instant.with_timezone(tz).date_naive(),
        }
    }

    /// Today's date in this zone
    pub fn today(&self) -> NaiveDate {
        self.date_of(Utc::now())
    }
}

impl std::fmt::Display for BoardTimeZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local => f.write_str("Local"),
            Self::Named(tz) => f.write_str(tz.name()),
        }
    }
}

/// Map a wall-clock time to an instant. Ambiguous times take the earlier
/// instant; times inside a gap move forward to the first valid wall clock.
fn resolve_wall_clock<Z: TimeZone>(tz: &Z, naive: NaiveDateTime) -> BoardResult<DateTime<Utc>> {
    let mut candidate = naive;
    for _ in 0..MAX_GAP_STEPS {
        match tz.from_local_datetime(&candidate) {
            LocalResult::Single(dt) => return Ok(dt.with_timezone(&Utc)),
            LocalResult::Ambiguous(earliest, _) => return Ok(earliest.with_timezone(&Utc)),
            LocalResult::None => candidate += Duration::minutes(GAP_STEP_MINUTES),
        }
    }
    Err(time_error(&format!("No valid local time near {}", naive)))
}

/// Absolute-time window sent to the calendar provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl QueryWindow {
    /// Cover the whole local day of `start` through the whole local day of `end`
    pub fn for_dates(tz: &BoardTimeZone, start: NaiveDate, end: NaiveDate) -> BoardResult<Self> {
        if start > end {
            return Err(Error::InvalidRange { start, end });
        }
        Ok(Self {
            start: tz.start_of_day(start)?,
            end: tz.end_of_day(end)?,
        })
    }

    /// `startDateTime` query value
    pub fn start_param(&self) -> String {
        self.start.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }

    /// `endDateTime` query value
    pub fn end_param(&self) -> String {
        self.end.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }
}

/// First and last calendar day of the month containing `date`
pub fn month_range(date: NaiveDate) -> BoardResult<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
        .ok_or_else(|| time_error(&format!("Invalid month for {}", date)))?;
    let next_month = if date.month() == 12 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
    };
    let last = next_month
        .and_then(|d| d.pred_opt())
        .ok_or_else(|| time_error(&format!("No month end for {}", date)))?;
    Ok((first, last))
}

/// Parse a `YYYY-MM` month argument into its first day
pub fn parse_month(value: &str) -> BoardResult<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", value.trim()), "%Y-%m-%d")
        .map_err(|e| time_error(&format!("Invalid month '{}': {}", value, e)))
}

/// Parse a Graph `dateTime` value such as `2021-02-03T10:00:00.0000000`
pub fn parse_graph_date_time(value: &str) -> BoardResult<NaiveDateTime> {
    let trimmed = value.trim().trim_end_matches('Z');
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .map_err(|e| time_error(&format!("Failed to parse datetime '{}': {}", value, e)))
}
