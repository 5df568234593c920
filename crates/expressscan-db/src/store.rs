//! # Store Traits
//!
//! The seams between the shopper services and persistence.
//!
//! ```text
//! ┌───────────────────┐   get_all / get / merge_write / delete   ┌──────────────┐
//! │ shopper services  │ ───────────────────────────────────────► │  CartStore   │
//! │ (cart, offers,    │                                          │  (SQLite:    │
//! │  checkout)        │ ◄─────────── CartSubscription ────────── │  CartRepo)   │
//! └───────────────────┘        snapshot per committed write      └──────────────┘
//!          │
//!          │ save_order / list_orders
//!          ▼
//! ┌───────────────────┐
//! │    OrderStore     │
//! └───────────────────┘
//! ```
//!
//! Services are generic over these traits so tests can wrap the SQLite
//! repositories (fault injection) or feed synthetic snapshots.

use std::future::Future;

use expressscan_core::planning::LineItemPatch;
use expressscan_core::types::{LineItem, Order, UserId};
use tokio::sync::mpsc;

use crate::error::DbResult;
use crate::subscription::CartSubscription;

// =============================================================================
// Cart Store
// =============================================================================

/// Per-user cart lines keyed by barcode.
pub trait CartStore: Send + Sync {
    /// Every line in the user's cart, ordered by barcode.
    fn get_all(&self, user: &UserId) -> impl Future<Output = DbResult<Vec<LineItem>>> + Send;

    /// One line, if present.
    fn get(
        &self,
        user: &UserId,
        barcode: &str,
    ) -> impl Future<Output = DbResult<Option<LineItem>>> + Send;

    /// Upserts one line by merging `patch` into it atomically.
    ///
    /// Returns the stored line, or `None` when the merge left no units and
    /// the line was deleted. Either way subscribers see a new snapshot.
    fn merge_write(
        &self,
        user: &UserId,
        patch: &LineItemPatch,
    ) -> impl Future<Output = DbResult<Option<LineItem>>> + Send;

    /// Removes a line with its offer metadata. Removing an absent line is
    /// not an error.
    fn delete(&self, user: &UserId, barcode: &str) -> impl Future<Output = DbResult<()>> + Send;

    /// Starts a change feed: the current cart, then the full cart after every
    /// committed write for this user.
    fn subscribe(&self, user: &UserId) -> impl Future<Output = DbResult<CartSubscription>> + Send;
}

// =============================================================================
// Order Store
// =============================================================================

/// Checked-out orders.
pub trait OrderStore: Send + Sync {
    fn save_order(&self, order: &Order) -> impl Future<Output = DbResult<()>> + Send;

    /// The user's orders, newest first.
    fn list_orders(&self, user: &UserId) -> impl Future<Output = DbResult<Vec<Order>>> + Send;

    fn get_order(
        &self,
        user: &UserId,
        id: &str,
    ) -> impl Future<Output = DbResult<Option<Order>>> + Send;
}

// =============================================================================
// Snapshot Source
// =============================================================================

/// Anything that yields raw cart snapshots, one at a time.
///
/// `None` means the feed has ended.
pub trait SnapshotSource: Send {
    fn next_snapshot(&mut self) -> impl Future<Output = Option<Vec<LineItem>>> + Send;
}

impl SnapshotSource for CartSubscription {
    async fn next_snapshot(&mut self) -> Option<Vec<LineItem>> {
        self.next().await.ok()
    }
}

/// Synthetic feeds for tests and replay.
impl SnapshotSource for mpsc::Receiver<Vec<LineItem>> {
    async fn next_snapshot(&mut self) -> Option<Vec<LineItem>> {
        self.recv().await
    }
}
