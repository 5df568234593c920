//! # Cart Service
//!
//! Scanning, quantity edits, removal and the priced cart view.
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Line Item Lifecycle                                  │
//! │                                                                         │
//! │   scan / apply_offer / reorder                                          │
//! │          │  merge_write (quantity += n)                                 │
//! │          ▼                                                              │
//! │   ┌──────────────┐   adjust_quantity(+n / -n)   ┌──────────────┐       │
//! │   │  In cart     │ ───────────────────────────► │  In cart     │       │
//! │   │  quantity>0  │ ◄─────────────────────────── │  quantity>0  │       │
//! │   └──────┬───────┘                              └──────────────┘       │
//! │          │ adjust_quantity to <= 0, remove, checkout                    │
//! │          ▼                                                              │
//! │   deleted with its offer metadata                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The service never caches cart state. Everything it returns was just read
//! from, or just committed to, the store.

use expressscan_core::catalog::ProductCatalog;
use expressscan_core::planning::{plan_quantity_adjustment, plan_scan_add};
use expressscan_core::pricing::PricedCart;
use expressscan_core::types::LineItem;
use expressscan_core::validation::{parse_scan_link, validate_cart_size};
use expressscan_core::CoreError;
use expressscan_db::CartStore;
use std::sync::Arc;
use tracing::{debug, info};

use super::PricingContext;
use crate::error::AppResult;
use crate::session::Session;
use crate::watcher::CartWatcher;

/// Cart operations over any [`CartStore`].
#[derive(Debug, Clone)]
pub struct CartService<C> {
    store: C,
    products: Arc<ProductCatalog>,
    pricing: PricingContext,
}

impl<C: CartStore> CartService<C> {
    pub fn new(store: C, products: ProductCatalog, pricing: PricingContext) -> Self {
        CartService {
            store,
            products: Arc::new(products),
            pricing,
        }
    }

    pub fn store(&self) -> &C {
        &self.store
    }

    /// Adds one unit of a scanned product.
    ///
    /// `scanned` is either a store deep link (`…?barcode=<code>`) or a bare
    /// barcode. Unknown barcodes fail with `ProductNotFound`.
    pub async fn scan(&self, session: &Session, scanned: &str) -> AppResult<LineItem> {
        let user = session.require_user()?;
        let barcode = parse_scan_link(scanned)?;
        let product = self.products.lookup(&barcode)?;

        let existing = self.store.get(user, &barcode).await?;
        if existing.is_none() {
            let lines = self.store.get_all(user).await?;
            validate_cart_size(lines.len())?;
        }

        let patch = plan_scan_add(product, existing.as_ref())?;
        debug!(user = %user, barcode = %barcode, "Adding scanned item");

        let line = self
            .store
            .merge_write(user, &patch)
            .await?
            .ok_or_else(|| CoreError::ItemNotInCart(barcode.clone()))?;

        info!(user = %user, barcode = %barcode, quantity = line.quantity, "Item scanned");
        Ok(line)
    }

    /// Changes one line's quantity by `delta`.
    ///
    /// Returns the updated line, or `None` when the line dropped to zero and
    /// was deleted. Offer quantity is clamped to the new quantity.
    pub async fn adjust_quantity(
        &self,
        session: &Session,
        barcode: &str,
        delta: i64,
    ) -> AppResult<Option<LineItem>> {
        let user = session.require_user()?;
        let item = self
            .store
            .get(user, barcode)
            .await?
            .ok_or_else(|| CoreError::ItemNotInCart(barcode.to_string()))?;

        let adjustment = plan_quantity_adjustment(&item, delta)?;
        debug!(user = %user, barcode = %barcode, delta, ?adjustment, "Adjusting quantity");

        match adjustment.to_patch(&item) {
            None => {
                self.store.delete(user, barcode).await?;
                info!(user = %user, barcode = %barcode, "Item removed at zero quantity");
                Ok(None)
            }
            Some(patch) => Ok(self.store.merge_write(user, &patch).await?),
        }
    }

    /// Deletes a line with its offer metadata.
    pub async fn remove(&self, session: &Session, barcode: &str) -> AppResult<()> {
        let user = session.require_user()?;
        self.store.delete(user, barcode).await?;
        info!(user = %user, barcode = %barcode, "Item removed");
        Ok(())
    }

    /// The raw lines as stored.
    pub async fn items(&self, session: &Session) -> AppResult<Vec<LineItem>> {
        let user = session.require_user()?;
        Ok(self.store.get_all(user).await?)
    }

    /// The cart priced with today's rules.
    pub async fn view(&self, session: &Session) -> AppResult<PricedCart> {
        let items = self.items(session).await?;
        Ok(self.pricing.price(&items))
    }

    /// Starts a live priced view of the cart. The first value is the cart as
    /// it is now; every committed write produces another.
    pub async fn watch(&self, session: &Session) -> AppResult<CartWatcher> {
        let user = session.require_user()?;
        let subscription = self.store.subscribe(user).await?;
        info!(user = %user, "Live cart view started");
        Ok(CartWatcher::spawn(subscription, self.pricing.clone()))
    }
}
