//! # Cart Change Notification
//!
//! Push-style cart snapshots, one broadcast channel per user.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  merge_write / delete (user U)                                          │
//! │       │                                                                 │
//! │       ├── lock write gate                                               │
//! │       ├── transaction: read row → merge → upsert/delete → COMMIT        │
//! │       ├── read U's cart                                                 │
//! │       ├── publish(U, snapshot) ──► broadcast::Sender<Vec<LineItem>>     │
//! │       └── unlock                            │                           │
//! │                                             ├──► CartSubscription #1    │
//! │                                             └──► CartSubscription #2    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Writes and subscriptions take the same gate, so the initial snapshot of a
//! new subscription and the snapshots that follow it never skip or reorder
//! a committed write.

use std::collections::HashMap;

use expressscan_core::types::{LineItem, UserId};
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::{broadcast, Mutex, MutexGuard, RwLock};
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};

/// Snapshots buffered per user before a slow subscriber starts lagging.
pub const DEFAULT_SNAPSHOT_CAPACITY: usize = 16;

// =============================================================================
// Notifier
// =============================================================================

/// Fan-out of cart snapshots to subscribers.
#[derive(Debug)]
pub struct CartNotifier {
    channels: RwLock<HashMap<UserId, broadcast::Sender<Vec<LineItem>>>>,
    write_gate: Mutex<()>,
    capacity: usize,
}

impl CartNotifier {
    pub fn new(capacity: usize) -> Self {
        CartNotifier {
            channels: RwLock::new(HashMap::new()),
            write_gate: Mutex::new(()),
            capacity: capacity.max(1),
        }
    }

    /// Serialises cart writes and snapshot reads.
    pub async fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.write_gate.lock().await
    }

    /// Sends a snapshot to the user's subscribers. Returns how many received
    /// it; channels without subscribers are dropped.
    pub async fn publish(&self, user: &UserId, snapshot: Vec<LineItem>) -> usize {
        let delivered = {
            let channels = self.channels.read().await;
            match channels.get(user) {
                Some(tx) => tx.send(snapshot).ok(),
                None => return 0,
            }
        };

        match delivered {
            Some(count) => {
                debug!(user = %user, subscribers = count, "Published cart snapshot");
                count
            }
            None => {
                self.channels.write().await.remove(user);
                debug!(user = %user, "Dropped cart channel without subscribers");
                0
            }
        }
    }

    /// Registers a subscriber whose first snapshot is `initial`.
    pub async fn subscribe(&self, user: &UserId, initial: Vec<LineItem>) -> CartSubscription {
        let mut channels = self.channels.write().await;
        let rx = match channels.get(user) {
            Some(tx) => tx.subscribe(),
            None => {
                let (tx, rx) = broadcast::channel(self.capacity);
                channels.insert(user.clone(), tx);
                rx
            }
        };
        debug!(user = %user, "Cart subscription started");
        CartSubscription::new(user.clone(), initial, rx)
    }

    /// Live subscribers for a user.
    pub async fn subscriber_count(&self, user: &UserId) -> usize {
        self.channels
            .read()
            .await
            .get(user)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }

    /// Closes every feed. Subscribers get `SubscriptionClosed` once they
    /// have drained what was already sent.
    pub async fn close_all(&self) {
        self.channels.write().await.clear();
    }
}

impl Default for CartNotifier {
    fn default() -> Self {
        CartNotifier::new(DEFAULT_SNAPSHOT_CAPACITY)
    }
}

// =============================================================================
// Subscription
// =============================================================================

/// A live feed of one user's cart. Dropping it unsubscribes.
#[derive(Debug)]
pub struct CartSubscription {
    user: UserId,
    initial: Option<Vec<LineItem>>,
    rx: broadcast::Receiver<Vec<LineItem>>,
}

impl CartSubscription {
    pub fn new(user: UserId, initial: Vec<LineItem>, rx: broadcast::Receiver<Vec<LineItem>>) -> Self {
        CartSubscription {
            user,
            initial: Some(initial),
            rx,
        }
    }

    pub fn user(&self) -> &UserId {
        &self.user
    }

    /// Waits for the next snapshot.
    ///
    /// A subscriber that fell behind skips straight to the newest snapshot:
    /// every snapshot is the full cart, so the ones in between carry nothing
    /// the newest does not.
    pub async fn next(&mut self) -> DbResult<Vec<LineItem>> {
        if let Some(initial) = self.initial.take() {
            return Ok(initial);
        }

        loop {
            match self.rx.recv().await {
                Ok(snapshot) => return Ok(snapshot),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(user = %self.user, skipped, "Cart subscriber lagged");
                    if let Some(latest) = self.drain_latest()? {
                        return Ok(latest);
                    }
                }
                Err(RecvError::Closed) => return Err(DbError::SubscriptionClosed),
            }
        }
    }

    fn drain_latest(&mut self) -> DbResult<Option<Vec<LineItem>>> {
        let mut latest = None;
        loop {
            match self.rx.try_recv() {
                Ok(snapshot) => latest = Some(snapshot),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty) => return Ok(latest),
                Err(TryRecvError::Closed) => {
                    return match latest {
                        Some(snapshot) => Ok(Some(snapshot)),
                        None => Err(DbError::SubscriptionClosed),
                    }
                }
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use expressscan_core::money::Money;

    fn snapshot(qty: i64) -> Vec<LineItem> {
        vec![LineItem::new("123456789012", "Milk", Money::from_rupees(30)).with_quantity(qty)]
    }

    #[tokio::test]
    async fn test_initial_then_published() {
        let notifier = CartNotifier::default();
        let user = UserId::new("u1");

        let mut sub = notifier.subscribe(&user, snapshot(1)).await;
        assert_eq!(notifier.publish(&user, snapshot(2)).await, 1);

        assert_eq!(sub.next().await.unwrap()[0].quantity, 1);
        assert_eq!(sub.next().await.unwrap()[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_publish_is_per_user() {
        let notifier = CartNotifier::default();
        let alice = UserId::new("alice");
        let bob = UserId::new("bob");

        let _sub = notifier.subscribe(&alice, Vec::new()).await;
        assert_eq!(notifier.publish(&bob, snapshot(1)).await, 0);
        assert_eq!(notifier.publish(&alice, snapshot(1)).await, 1);
    }

    #[tokio::test]
    async fn test_lagging_subscriber_skips_to_newest() {
        let notifier = CartNotifier::new(2);
        let user = UserId::new("u1");

        let mut sub = notifier.subscribe(&user, Vec::new()).await;
        assert!(sub.next().await.unwrap().is_empty());

        for qty in 1..=5 {
            notifier.publish(&user, snapshot(qty)).await;
        }

        assert_eq!(sub.next().await.unwrap()[0].quantity, 5);
    }

    #[tokio::test]
    async fn test_drop_unsubscribes() {
        let notifier = CartNotifier::default();
        let user = UserId::new("u1");

        let sub = notifier.subscribe(&user, Vec::new()).await;
        assert_eq!(notifier.subscriber_count(&user).await, 1);

        drop(sub);
        assert_eq!(notifier.subscriber_count(&user).await, 0);
        assert_eq!(notifier.publish(&user, snapshot(1)).await, 0);
    }

    #[tokio::test]
    async fn test_close_all_ends_feeds() {
        let notifier = CartNotifier::default();
        let user = UserId::new("u1");

        let mut sub = notifier.subscribe(&user, Vec::new()).await;
        sub.next().await.unwrap();
        notifier.close_all().await;

        assert!(matches!(sub.next().await, Err(DbError::SubscriptionClosed)));
    }
}
