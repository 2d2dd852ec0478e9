// Board components
pub mod board;
pub mod calendar;

pub use board::CalendarGrid;
pub use calendar::CalendarManager;
