use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};
#[cfg(windows)]
use tokio::signal::windows::{ctrl_break, ctrl_c};

/// Cancel `cancel` when the process receives a termination signal
pub async fn cancel_on_signal(cancel: CancellationToken) {
    tokio::select! {
        _ = cancel.cancelled() => {}
        received = wait_for_signal() => {
            if let Err(e) = received {
                error!("Failed to install signal handlers: {:?}", e);
                return;
            }
            info!("Cancelling in-flight calendar requests");
            cancel.cancel();
        }
    }
}

/// Platform-specific signal handling implementation
#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<()> {
    // SIGTERM from systemd when the board service stops
    let mut sigterm = signal(SignalKind::terminate())?;
    // SIGINT (Ctrl+C)
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = sigterm.recv() => {
            info!("Received SIGTERM signal, shutting down");
        }
        _ = sigint.recv() => {
            info!("Received SIGINT signal, shutting down");
        }
    }
    Ok(())
}

/// Platform-specific signal handling implementation
#[cfg(windows)]
async fn wait_for_signal() -> std::io::Result<()> {
    let mut ctrlc = ctrl_c()?;
    let mut ctrlbreak = ctrl_break()?;

    tokio::select! {
        _ = ctrlc.recv() => {
            info!("Received Ctrl+C signal, shutting down");
        }
        _ = ctrlbreak.recv() => {
            info!("Received Ctrl+Break signal, shutting down");
        }
    }
    Ok(())
}
