//! Periodic eviction of old terminal jobs.
//!
//! The sweeper is owned by the process's top-level lifecycle, not by the
//! registry: tests can run a [`JobRegistry`] without any live timer, and
//! production code can shut the loop down deterministically.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::jobs::JobRegistry;

/// Handle to a running sweep loop.
pub struct JobSweeper {
    handle: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
}

impl JobSweeper {
    /// Starts a sweep loop on its own interval, independent of request
    /// traffic. Each tick evicts terminal jobs older than `retention`.
    #[must_use]
    pub fn start(registry: Arc<JobRegistry>, cadence: Duration, retention: Duration) -> Self {
        let (shutdown, mut signal) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(cadence);
            // The first tick of an interval fires immediately; a sweep of a
            // fresh registry is harmless, so no special casing.
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = registry.sweep(retention);
                        if removed > 0 {
                            tracing::info!(removed, "sweeper evicted terminal jobs");
                        }
                    }
                    changed = signal.changed() => {
                        if changed.is_err() || *signal.borrow() {
                            tracing::debug!("sweeper shutting down");
                            break;
                        }
                    }
                }
            }
        });

        Self { handle, shutdown }
    }

    /// Stops the loop and waits for it to finish.
    pub async fn shutdown(self) {
        if self.shutdown.send(true).is_err() {
            // Loop already gone; nothing to stop.
            return;
        }
        if self.handle.await.is_err() {
            tracing::warn!("sweeper task panicked during shutdown");
        }
    }

    /// Whether the loop has already exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
