//! Shutdown signal handling.
//!
//! [`SigDown`] turns SIGTERM or SIGINT (Ctrl+C on Windows) into a
//! [`CancellationToken`] that the HTTP server and any background task can
//! wait on.

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Cancels a token when the process is asked to stop.
#[allow(missing_debug_implementations)] // TaskTracker doesn't impl Debug
pub struct SigDown {
    task_tracker: TaskTracker,
    cancellation_token: CancellationToken,
}

impl SigDown {
    /// Installs the signal listeners.
    ///
    /// # Errors
    ///
    /// Returns [`std::io::Error`] if a signal handler cannot be registered.
    #[allow(clippy::unnecessary_wraps)] // only fallible on Unix
    pub fn try_new() -> Result<Self, std::io::Error> {
        let token = CancellationToken::new();
        let task_tracker = TaskTracker::new();
        let trigger = token.clone();

        #[cfg(unix)]
        {
            let mut sigterm = signal(SignalKind::terminate())?;
            let mut sigint = signal(SignalKind::interrupt())?;
            task_tracker.spawn(async move {
                tokio::select! {
                    _ = sigterm.recv() => tracing::info!("Received SIGTERM, shutting down"),
                    _ = sigint.recv() => tracing::info!("Received SIGINT, shutting down"),
                }
                trigger.cancel();
            });
        }

        #[cfg(windows)]
        {
            task_tracker.spawn(async move {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("Received Ctrl-C, shutting down");
                trigger.cancel();
            });
        }

        task_tracker.close();
        Ok(Self {
            task_tracker,
            cancellation_token: token,
        })
    }

    /// A token cancelled once a shutdown signal arrives.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// Waits for the shutdown signal and for the listener task to finish.
    pub async fn recv(&self) {
        self.cancellation_token.cancelled().await;
        self.task_tracker.wait().await;
    }
}
