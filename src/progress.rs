use crate::config::ProgressPolicy;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Approximate completion readout for a running batch. Interim values are
/// wall-clock estimates, not completion signals; the final value published
/// by the tracker is the true success count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub current: u32,
    pub total: u32,
}

impl Progress {
    pub fn start(total: u32) -> Self {
        Self { current: 0, total }
    }

    /// One estimated step, capped at the total so the signal stays
    /// monotonically non-decreasing.
    pub fn advanced(self) -> Self {
        Self {
            current: (self.current + 1).min(self.total),
            total: self.total,
        }
    }

    pub fn is_full(self) -> bool {
        self.current >= self.total
    }
}

/// Publishes the estimated progress of the current batch on a watch
/// channel: `None` when idle, `Some(progress)` while running and during the
/// brief hold after completion.
pub struct ProgressTracker {
    tx: Arc<watch::Sender<Option<Progress>>>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressTracker {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            tx: Arc::new(tx),
            ticker: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Progress>> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> Option<Progress> {
        *self.tx.borrow()
    }

    /// Publishes `0/total` and starts a ticker that advances the estimate by
    /// one item per `policy.tick`, independent of actual network completion.
    pub fn begin(&self, total: u32, policy: &ProgressPolicy) {
        self.stop_ticker();
        self.tx.send_replace(Some(Progress::start(total)));

        let tx = Arc::clone(&self.tx);
        let tick = policy.tick;
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            // The first interval tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                let mut full = false;
                tx.send_modify(|progress| {
                    if let Some(p) = progress.as_mut() {
                        *p = p.advanced();
                        full = p.is_full();
                    }
                });
                if full {
                    break;
                }
            }
        });
        self.store_ticker(handle);
    }

    /// Corrects the readout to the true success count, holds it for
    /// `policy.hold` so the caller gets an accurate final glimpse, then
    /// clears the signal.
    pub fn finish(&self, success_count: u32, policy: &ProgressPolicy) {
        self.stop_ticker();

        let total = self
            .tx
            .borrow()
            .map(|p| p.total)
            .unwrap_or(success_count);
        self.tx.send_replace(Some(Progress {
            current: success_count,
            total,
        }));

        let tx = Arc::clone(&self.tx);
        let hold = policy.hold;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(hold).await;
            tx.send_replace(None);
        });
        self.store_ticker(handle);
    }

    fn store_ticker(&self, handle: JoinHandle<()>) {
        if let Ok(mut ticker) = self.ticker.lock() {
            *ticker = Some(handle);
        }
    }

    fn stop_ticker(&self) {
        if let Ok(mut ticker) = self.ticker.lock() {
            if let Some(handle) = ticker.take() {
                handle.abort();
            }
        }
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        self.stop_ticker();
    }
}
