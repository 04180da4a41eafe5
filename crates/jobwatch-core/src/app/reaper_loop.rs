//! ReaperLoop - runs `ReaperService::sweep` on a fixed period.
//!
//! Sweeps are idempotent, so several processes may each run a loop against
//! the same store; the compare-and-swap commit keeps their writes from
//! conflicting.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use super::reaper::{ReaperService, SweepResult};

/// Shortest period the loop will tick at. `tokio::time::interval` rejects zero.
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(1);

/// Handle of a running reaper task.
/// - `request_shutdown` stops it after the sweep in flight (if any)
/// - `subscribe` exposes the latest sweep result
pub struct ReaperLoop {
    shutdown_tx: watch::Sender<bool>,
    results_rx: watch::Receiver<Option<SweepResult>>,
    join: JoinHandle<()>,
}

impl ReaperLoop {
    /// Sweep every `interval`, the first time immediately.
    ///
    /// An `interval` below [`MIN_SWEEP_INTERVAL`] is raised to it.
    ///
    /// # Example
    /// ```ignore
    /// let reaper_loop = ReaperLoop::spawn(reaper, 1200, Duration::from_secs(60));
    /// let mut results = reaper_loop.subscribe();
    /// results.changed().await?;
    /// reaper_loop.shutdown_and_join().await;
    /// ```
    pub fn spawn(reaper: Arc<ReaperService>, dead_after_secs: u64, interval: Duration) -> Self {
        let interval = interval.max(MIN_SWEEP_INTERVAL);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (results_tx, results_rx) = watch::channel(None);

        let join = tokio::spawn(reaper_loop(
            reaper,
            dead_after_secs,
            interval,
            shutdown_rx,
            results_tx,
        ));

        Self {
            shutdown_tx,
            results_rx,
            join,
        }
    }

    /// Latest sweep result; `None` until the first sweep completes.
    pub fn subscribe(&self) -> watch::Receiver<Option<SweepResult>> {
        self.results_rx.clone()
    }

    /// Ask the loop to stop without waiting for it.
    pub fn request_shutdown(&self) {
        // receiver gone means the loop already ended
        let _ = self.shutdown_tx.send(true);
    }

    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        let _ = self.join.await;
    }
}

async fn reaper_loop(
    reaper: Arc<ReaperService>,
    dead_after_secs: u64,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
    results_tx: watch::Sender<Option<SweepResult>>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    debug!("reaper loop stopping");
                    break;
                }
            }
            _ = ticker.tick() => {
                match reaper.sweep(dead_after_secs).await {
                    Ok(result) => {
                        results_tx.send_replace(Some(result));
                    }
                    Err(err) => warn!(error = %err, "sweep could not list candidates"),
                }
            }
        }
    }
}
