pub mod grid;
pub mod render;

pub use grid::{parse_weekday, CalendarDay, CalendarGrid, CalendarWeek};
pub use render::render_text;
