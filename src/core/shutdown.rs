//! # Cross-platform shutdown triggers.
//!
//! Provides [`wait_for_shutdown`], which completes when the process receives a
//! termination signal or the supervisor's cancellation token fires.
//!
//! ## Signals
//! **Unix platforms:**
//! - `SIGINT` (Ctrl-C in terminal)
//! - `SIGTERM` (default kill signal, used by systemd/Kubernetes)
//! - `SIGQUIT` (quit signal, often used for core dumps or hard stop)
//!
//! **Windows platforms:**
//! - `Ctrl-C` via [`tokio::signal::ctrl_c`]

use tokio_util::sync::CancellationToken;

/// What ended the wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ShutdownCause {
    Signal,
    Cancelled,
}

impl ShutdownCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShutdownCause::Signal => "signal",
            ShutdownCause::Cancelled => "cancelled",
        }
    }
}

/// Waits for a termination signal or for `token` to be cancelled.
///
/// Returns `Err` if signal registration fails.
pub(crate) async fn wait_for_shutdown(
    token: &CancellationToken,
) -> std::io::Result<ShutdownCause> {
    tokio::select! {
        res = wait_for_shutdown_signal() => res.map(|()| ShutdownCause::Signal),
        _ = token.cancelled() => Ok(ShutdownCause::Cancelled),
    }
}

/// Waits for a termination signal.
///
/// Each call creates independent signal listeners.
#[cfg(unix)]
async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {},
        _ = sigint.recv()  => {},
        _ = sigterm.recv() => {},
        _ = sigquit.recv() => {},
    }
    Ok(())
}

/// Waits for a termination signal.
#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
