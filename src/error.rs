use miette::{Diagnostic, Result};
use thiserror::Error;

/// Main error type for the board
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Environment error: {0}")]
    #[diagnostic(code(familyboard::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(familyboard::config))]
    Config(String),

    #[error("Calendar not found: {0}")]
    #[diagnostic(
        code(familyboard::calendar_not_found),
        help("Calendar names are matched exactly, including case")
    )]
    CalendarNotFound(String),

    #[error("Calendar name '{name}' matches {count} calendars")]
    #[diagnostic(code(familyboard::ambiguous_calendar))]
    AmbiguousCalendar { name: String, count: usize },

    #[error("Calendar API error: HTTP {status} - {body}")]
    #[diagnostic(code(familyboard::upstream))]
    Upstream { status: u16, body: String },

    #[error("HTTP error: {0}")]
    #[diagnostic(code(familyboard::http))]
    Http(#[from] reqwest::Error),

    #[error("Authorization error: {0}")]
    #[diagnostic(code(familyboard::auth))]
    Auth(String),

    #[error("Invalid date range: {start} is after {end}")]
    #[diagnostic(code(familyboard::invalid_range))]
    InvalidRange {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    #[error("Time error: {0}")]
    #[diagnostic(code(familyboard::time))]
    Time(String),

    #[error("Operation cancelled")]
    #[diagnostic(code(familyboard::cancelled))]
    Cancelled,

    #[error(transparent)]
    #[diagnostic(code(familyboard::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(familyboard::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(familyboard::other))]
    Other(String),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl Error {
    /// True when the error came from the caller's cancellation signal
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

/// Type alias for Result with our Error type
pub type BoardResult<T> = Result<T, Error>;

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Missing environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create authorization errors
pub fn auth_error(message: &str) -> Error {
    Error::Auth(message.to_string())
}

/// Helper to create time conversion errors
pub fn time_error(message: &str) -> Error {
    Error::Time(message.to_string())
}

/// Helper to create other errors
pub fn other_error(message: &str) -> Error {
    Error::Other(message.to_string())
}
