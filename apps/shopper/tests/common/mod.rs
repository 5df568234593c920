//! Shared fixtures for the service tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use expressscan_core::catalog::ProductCatalog;
use expressscan_core::fixtures;
use expressscan_core::money::Money;
use expressscan_core::planning::{FieldUpdate, LineItemPatch};
use expressscan_core::types::{LineItem, UserId};
use expressscan_db::{
    CartRepository, CartStore, CartSubscription, Database, DbConfig, DbError, DbResult,
};
use expressscan_shopper::config::StoreSettings;
use expressscan_shopper::services::{CartService, CheckoutService, OfferService, PricingContext};
use expressscan_shopper::session::Session;

pub const MILK: &str = "123456789012";
pub const CORNFLAKES: &str = "000111222333";
pub const EGGS: &str = "111122223333";
pub const BREAD: &str = "987654321098";
pub const JAM: &str = "123123123123";

/// A day on which every launch promotion except Parle-G is still running.
pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 7, 10).unwrap()
}

pub fn pricing() -> PricingContext {
    PricingContext::as_of(fixtures::offer_catalog(), today())
}

pub fn shopper() -> Session {
    Session::signed_in("uid-shopper").unwrap()
}

pub async fn database() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

/// Puts `count` distinct filler lines straight into the user's cart.
pub async fn fill_cart<C: CartStore>(store: &C, session: &Session, count: usize) {
    let user = session.require_user().unwrap();
    for i in 0..count {
        let patch = LineItemPatch::new(format!("{i:012}"))
            .with_product("Filler", Money::from_rupees(1))
            .with_quantity(FieldUpdate::Increment(1));
        store.merge_write(user, &patch).await.unwrap();
    }
}

pub struct Services<C> {
    pub carts: CartService<C>,
    pub offers: OfferService<C>,
    pub checkout: CheckoutService<C, expressscan_db::OrderRepository>,
}

/// All three services over one cart store.
pub fn services<C: CartStore + Clone>(store: C, db: &Database) -> Services<C> {
    Services {
        carts: CartService::new(store.clone(), ProductCatalog::store_default(), pricing()),
        offers: OfferService::new(store.clone(), pricing()),
        checkout: CheckoutService::new(store, db.orders(), StoreSettings::default(), pricing()),
    }
}

// =============================================================================
// Fault injection
// =============================================================================

/// Wraps the SQLite cart store and fails writes for chosen barcodes.
///
/// It can also slip one extra write in ahead of the next merge-write, the
/// way a second device scanning at the same moment would. Reads and
/// subscriptions always pass through.
#[derive(Debug, Clone)]
pub struct FlakyCartStore {
    inner: CartRepository,
    failing: Arc<Mutex<HashSet<String>>>,
    interleaved: Arc<Mutex<Option<LineItemPatch>>>,
}

impl FlakyCartStore {
    pub fn new(inner: CartRepository) -> Self {
        FlakyCartStore {
            inner,
            failing: Arc::new(Mutex::new(HashSet::new())),
            interleaved: Arc::new(Mutex::new(None)),
        }
    }

    pub fn interleave_before_next_write(&self, patch: LineItemPatch) {
        *self.interleaved.lock().unwrap() = Some(patch);
    }

    pub fn fail_writes_for(&self, barcode: &str) {
        self.failing.lock().unwrap().insert(barcode.to_string());
    }

    pub fn heal(&self) {
        self.failing.lock().unwrap().clear();
    }

    fn check(&self, barcode: &str) -> DbResult<()> {
        if self.failing.lock().unwrap().contains(barcode) {
            return Err(DbError::QueryFailed(format!("injected failure for {barcode}")));
        }
        Ok(())
    }
}

impl CartStore for FlakyCartStore {
    async fn get_all(&self, user: &UserId) -> DbResult<Vec<LineItem>> {
        self.inner.get_all(user).await
    }

    async fn get(&self, user: &UserId, barcode: &str) -> DbResult<Option<LineItem>> {
        self.inner.get(user, barcode).await
    }

    async fn merge_write(&self, user: &UserId, patch: &LineItemPatch) -> DbResult<Option<LineItem>> {
        self.check(&patch.barcode)?;
        let pending = self.interleaved.lock().unwrap().take();
        if let Some(pending) = pending {
            self.inner.merge_write(user, &pending).await?;
        }
        self.inner.merge_write(user, patch).await
    }

    async fn delete(&self, user: &UserId, barcode: &str) -> DbResult<()> {
        self.check(barcode)?;
        self.inner.delete(user, barcode).await
    }

    async fn subscribe(&self, user: &UserId) -> DbResult<CartSubscription> {
        self.inner.subscribe(user).await
    }
}
