use crate::components::board::{render_text, CalendarGrid};
use crate::components::calendar::{self, time::parse_month, EventsOutcome};
use crate::config::Config;
use crate::error::{other_error, Error};
use chrono::NaiveDate;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper=warn")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load the application config
pub fn load_config() -> miette::Result<Config> {
    match Config::load() {
        Ok(config) => Ok(config),
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Month requested with `--month YYYY-MM`, if any
pub fn month_from_args<I>(args: I) -> miette::Result<Option<NaiveDate>>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if arg == "--month" {
            let value = args
                .next()
                .ok_or_else(|| other_error("--month needs a value like 2021-02"))?;
            return Ok(Some(parse_month(&value)?));
        }
        if let Some(value) = arg.strip_prefix("--month=") {
            return Ok(Some(parse_month(value)?));
        }
    }
    Ok(None)
}

/// Fetch the month's events and print the board
pub async fn run_board(
    config: Config,
    month: Option<NaiveDate>,
    cancel: CancellationToken,
) -> miette::Result<()> {
    let manager = calendar::manager_from_config(&config)?;
    let timezone = manager.timezone();
    let month = month.unwrap_or_else(|| timezone.today());

    info!(
        calendar = %config.calendar_name,
        %timezone,
        month = %month.format("%Y-%m"),
        "Fetching board events"
    );

    let outcome = manager
        .get_months_events(&config.calendar_name, month, &cancel)
        .await?;

    if let EventsOutcome::Failed { reason } = &outcome {
        warn!(%reason, "Showing an empty board because the fetch failed");
    }

    let grid =
        CalendarGrid::for_month(month, config.week_start()?, outcome.into_events(), &timezone)?;
    println!("{}", render_text(&grid, &timezone));

    Ok(())
}
