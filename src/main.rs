use familyboard::{shutdown, startup};
use tokio_util::sync::CancellationToken;
use tracing::info;

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Initialize logging
    startup::init_logging()?;

    info!("Starting familyboard");

    let month = startup::month_from_args(std::env::args().skip(1))?;

    // Load configuration
    let config = startup::load_config()?;

    // Ctrl+C aborts the fetch instead of showing an empty board
    let cancel = CancellationToken::new();
    let signals = tokio::spawn(shutdown::cancel_on_signal(cancel.clone()));

    let result = startup::run_board(config, month, cancel.clone()).await;

    cancel.cancel();
    let _ = signals.await;
    result
}
