// src/signal.rs
//! Termination signal listener
//!
//! The listener is the only writer of the cancellation token handed to the
//! query executor. It fires at most once and then exits.

use std::future::Future;
use std::io;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Spawn a task that cancels `cancel` on SIGINT or SIGTERM
pub fn spawn_signal_listener(cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(cancel_on(cancel, wait_for_termination()))
}

/// Cancel `cancel` once `signal` resolves, unless the token is cancelled first
pub async fn cancel_on<F>(cancel: CancellationToken, signal: F)
where
    F: Future<Output = io::Result<&'static str>>,
{
    tokio::select! {
        _ = cancel.cancelled() => {}
        received = signal => match received {
            Ok(name) => {
                info!("Cancelling operations due to ({})", name);
                cancel.cancel();
                info!("operations cancelled");
            }
            Err(e) => error!("Failed to register termination signal handler: {}", e),
        },
    }
}

#[cfg(unix)]
async fn wait_for_termination() -> io::Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = sigterm.recv() => Ok("terminated"),
        _ = sigint.recv() => Ok("interrupt"),
    }
}

#[cfg(not(unix))]
async fn wait_for_termination() -> io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("interrupt")
}
