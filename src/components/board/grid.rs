use crate::components::calendar::time::month_range;
use crate::components::calendar::{BoardTimeZone, CalendarEvent};
use crate::error::BoardResult;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use tracing::debug;

/// One cell of the month grid
#[derive(Debug, Clone)]
pub struct CalendarDay {
    pub date: NaiveDate,
    /// False for the leading and trailing days borrowed from adjacent months
    pub in_month: bool,
    pub events: Vec<CalendarEvent>,
}

/// Seven consecutive days starting on the board's first weekday
#[derive(Debug, Clone)]
pub struct CalendarWeek {
    pub days: Vec<CalendarDay>,
}

/// Month laid out as whole weeks, with events on the day they start
#[derive(Debug, Clone)]
pub struct CalendarGrid {
    pub month: NaiveDate,
    pub first_weekday: Weekday,
    pub weeks: Vec<CalendarWeek>,
}

impl CalendarGrid {
    /// Lay out the month containing `date`.
    ///
    /// Events keep their provider order within a day. Events starting outside
    /// the visible span are dropped.
    pub fn for_month(
        date: NaiveDate,
        first_weekday: Weekday,
        events: Vec<CalendarEvent>,
        timezone: &BoardTimeZone,
    ) -> BoardResult<Self> {
        let (first, last) = month_range(date)?;
        let grid_start = week_start(first, first_weekday);
        let grid_end = week_start(last, first_weekday) + Duration::days(6);

        let mut weeks = Vec::new();
        let mut day = grid_start;
        while day <= grid_end {
            let days = (0..7)
                .map(|offset| {
                    let date = day + Duration::days(offset);
                    CalendarDay {
                        date,
                        in_month: date >= first && date <= last,
                        events: Vec::new(),
                    }
                })
                .collect();
            weeks.push(CalendarWeek { days });
            day += Duration::days(7);
        }

        let mut grid = Self {
            month: first,
            first_weekday,
            weeks,
        };

        for event in events {
            let Some(start) = event.start_date(timezone) else {
                debug!(event_id = %event.id, "Event has no usable start, skipping");
                continue;
            };
            match grid.day_mut(start) {
                Some(cell) => cell.events.push(event),
                None => debug!(event_id = %event.id, %start, "Event outside grid, skipping"),
            }
        }

        Ok(grid)
    }

    pub fn day(&self, date: NaiveDate) -> Option<&CalendarDay> {
        self.weeks
            .iter()
            .flat_map(|w| w.days.iter())
            .find(|d| d.date == date)
    }

    fn day_mut(&mut self, date: NaiveDate) -> Option<&mut CalendarDay> {
        self.weeks
            .iter_mut()
            .flat_map(|w| w.days.iter_mut())
            .find(|d| d.date == date)
    }

    pub fn event_count(&self) -> usize {
        self.weeks
            .iter()
            .flat_map(|w| w.days.iter())
            .map(|d| d.events.len())
            .sum()
    }
}

/// Parse `sunday` / `monday` style weekday names
pub fn parse_weekday(value: &str) -> Option<Weekday> {
    value.trim().parse::<Weekday>().ok()
}

/// Latest `first_weekday` on or before `date`
fn week_start(date: NaiveDate, first_weekday: Weekday) -> NaiveDate {
    let back =
        (7 + date.weekday().num_days_from_monday() - first_weekday.num_days_from_monday()) % 7;
    date - Duration::days(back as i64)
}
