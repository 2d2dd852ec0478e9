use super::grid::CalendarGrid;
use crate::components::calendar::BoardTimeZone;
use chrono::Datelike;
use std::fmt::Write;

const NO_EVENTS: &str = "No events this month.";
const UNNAMED_EVENT: &str = "Unnamed event";
const ALL_DAY: &str = "all day";

/// Plain-text board: weekday header, one line of day numbers per week,
/// then the month's events grouped by day
pub fn render_text(grid: &CalendarGrid, timezone: &BoardTimeZone) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", grid.month.format("%B %Y"));

    let header: Vec<String> = grid
        .weeks
        .first()
        .map(|week| week.days.iter().map(|d| d.date.format("%a").to_string()).collect())
        .unwrap_or_default();
    let _ = writeln!(out, "{}", header.join(" "));

    for week in &grid.weeks {
        let cells: Vec<String> = week
            .days
            .iter()
            .map(|day| {
                let marker = if day.events.is_empty() { ' ' } else { '*' };
                if day.in_month {
                    format!("{:>2}{}", day.date.day(), marker)
                } else {
                    "   ".to_string()
                }
            })
            .collect();
        let _ = writeln!(out, "{}", cells.join(" "));
    }

    if grid.event_count() == 0 {
        let _ = writeln!(out, "\n{}", NO_EVENTS);
        return out;
    }

    for day in grid.weeks.iter().flat_map(|w| w.days.iter()) {
        if !day.in_month || day.events.is_empty() {
            continue;
        }
        let _ = writeln!(out, "\n{}", day.date.format("%A %d.%m."));
        for event in &day.events {
            let title = event.subject.as_deref().unwrap_or(UNNAMED_EVENT);
            let time = event
                .start_time_label(timezone)
                .unwrap_or_else(|| ALL_DAY.to_string());
            let _ = writeln!(out, "• {} ({})", title, time);
        }
    }

    out
}
