//! Expiry Sweep Task
//!
//! Background task that periodically removes expired entries from an
//! in-process store.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::cache::memory::{purge_expired, Entries};
use crate::cache::stats::StoreCounters;

/// Handle to a running sweep task.
///
/// Dropping the handle also stops the task, since the loop exits when its
/// shutdown channel closes.
#[derive(Debug)]
pub(crate) struct Sweeper {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Sweeper {
    /// Signals the task to stop and waits for it to finish.
    pub(crate) async fn stop(self) {
        // Err only means the task already exited
        let _ = self.shutdown.send(true);
        if let Err(e) = self.handle.await {
            warn!(error = %e, "Expiry sweep task ended abnormally");
        }
    }
}

/// Spawns a task that removes expired entries every `interval`.
///
/// Each pass holds the store's write lock only while it purges. The first
/// pass runs one full interval after the call.
pub(crate) fn spawn_sweeper(
    entries: Entries,
    counters: Arc<StoreCounters>,
    interval: Duration,
) -> Sweeper {
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let handle = tokio::spawn(async move {
        let interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        debug!(interval_ms, "Starting expiry sweep");

        let mut ticker = interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = {
                        let mut guard = entries.write().await;
                        purge_expired(&mut guard, Instant::now())
                    };

                    if removed > 0 {
                        counters.record_reaped(removed as u64);
                        info!(removed, "Expiry sweep: removed expired entries");
                    } else {
                        debug!("Expiry sweep: no expired entries found");
                    }
                }
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        debug!("Expiry sweep stopped");
                        break;
                    }
                }
            }
        }
    });

    Sweeper {
        shutdown: shutdown_tx,
        handle,
    }
}
