//! # Live Cart Pricing
//!
//! Reprices the cart every time the store delivers a snapshot.
//!
//! ```text
//! ┌──────────────────┐ raw snapshot ┌────────────────────┐ PricedCart ┌────────────┐
//! │  SnapshotSource  │ ───────────► │  watcher task      │ ─────────► │ watch chan │
//! │  (subscription,  │              │  compute_cart(...)  │            │ (latest    │
//! │   mpsc in tests) │              └────────────────────┘            │  value)    │
//! └──────────────────┘                                                 └────────────┘
//! ```
//!
//! Only confirmed snapshots are priced; nothing optimistic is ever shown.
//! The watch channel keeps the latest value only, so a slow reader skips
//! intermediate carts instead of queueing them.

use expressscan_core::pricing::PricedCart;
use expressscan_db::SnapshotSource;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::services::PricingContext;

pub struct CartWatcher {
    rx: watch::Receiver<PricedCart>,
    task: JoinHandle<()>,
}

impl CartWatcher {
    /// Spawns the pricing task on the current runtime.
    ///
    /// The task ends when the source ends or every receiver is gone.
    pub fn spawn<S>(mut source: S, pricing: PricingContext) -> Self
    where
        S: SnapshotSource + 'static,
    {
        let (tx, rx) = watch::channel(PricedCart::default());

        let task = tokio::spawn(async move {
            let mut seen = 0u64;
            while let Some(snapshot) = source.next_snapshot().await {
                seen += 1;
                let priced = pricing.price(&snapshot);
                trace!(seen, total = %priced.total, "Cart repriced");
                if tx.send(priced).is_err() {
                    break;
                }
            }
            debug!(seen, "Cart watcher finished");
        });

        CartWatcher { rx, task }
    }

    /// Waits for the next priced cart. `None` once the feed has ended.
    pub async fn next(&mut self) -> Option<PricedCart> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// The most recent priced cart (empty until the first snapshot).
    pub fn current(&self) -> PricedCart {
        self.rx.borrow().clone()
    }

    /// Another handle on the same feed.
    pub fn receiver(&self) -> watch::Receiver<PricedCart> {
        self.rx.clone()
    }

    pub fn stop(self) {
        self.task.abort();
    }
}

impl Drop for CartWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
