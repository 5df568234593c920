//! # Services
//!
//! The operations the front end invokes. Each one takes the [`Session`]
//! explicitly, plans its writes with `expressscan-core`, and performs them
//! through a [`CartStore`].
//!
//! ```text
//! services/
//! ├── mod.rs       ◄─── PricingContext + the per-item write loop
//! ├── cart.rs      ◄─── scan, adjust_quantity, remove, view, watch
//! ├── offers.rs    ◄─── list active offers, apply_offer, retry failed items
//! └── checkout.rs  ◄─── payment link, confirm payment, history, reorder
//! ```
//!
//! [`Session`]: crate::session::Session

pub mod cart;
pub mod checkout;
pub mod offers;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::NaiveDate;
use expressscan_core::offers::OfferCatalog;
use expressscan_core::planning::LineItemPatch;
use expressscan_core::pricing::{compute_cart, PricedCart, PricingRules};
use expressscan_core::types::{LineItem, UserId};
use expressscan_core::validation::validate_cart_growth;
use expressscan_db::CartStore;
use tracing::{debug, warn};

use crate::config::PricingSettings;
use crate::error::{AppError, AppResult, FailedWrite};

pub use cart::CartService;
pub use checkout::{CheckoutReceipt, CheckoutService, PaymentRequestView};
pub use offers::{OfferOutcome, OfferService};

// =============================================================================
// Pricing Context
// =============================================================================

/// The offer catalog and the day offers are judged against.
#[derive(Debug, Clone)]
pub struct PricingContext {
    offers: Arc<OfferCatalog>,
    settings: PricingSettings,
}

impl PricingContext {
    pub fn new(offers: OfferCatalog, settings: PricingSettings) -> Self {
        PricingContext {
            offers: Arc::new(offers),
            settings,
        }
    }

    /// Pins the pricing date.
    pub fn as_of(offers: OfferCatalog, today: NaiveDate) -> Self {
        PricingContext::new(offers, PricingSettings { as_of: Some(today) })
    }

    pub fn offers(&self) -> &OfferCatalog {
        &self.offers
    }

    pub fn today(&self) -> NaiveDate {
        self.settings.today()
    }

    /// Cart-wide rules in force today.
    pub fn rules(&self) -> PricingRules {
        PricingRules::from_catalog(&self.offers, self.today())
    }

    pub fn price(&self, items: &[LineItem]) -> PricedCart {
        compute_cart(items, &self.rules())
    }
}

// =============================================================================
// Per-item writes
// =============================================================================

/// Checks every patch against the stored lines before anything is written,
/// so limit violations reject the whole operation with no writes.
///
/// Covers both the per-item quantity cap and the number of distinct lines
/// the patches would add to the cart.
pub(crate) async fn check_limits<C: CartStore>(
    store: &C,
    user: &UserId,
    patches: &[LineItemPatch],
) -> AppResult<()> {
    let lines: HashMap<String, LineItem> = store
        .get_all(user)
        .await?
        .into_iter()
        .map(|line| (line.barcode.clone(), line))
        .collect();

    let new_lines: HashSet<&str> = patches
        .iter()
        .map(|p| p.barcode.as_str())
        .filter(|barcode| !lines.contains_key(*barcode))
        .collect();
    validate_cart_growth(lines.len(), new_lines.len())?;

    for patch in patches {
        patch.check_quantity_limit(lines.get(&patch.barcode))?;
    }
    Ok(())
}

/// Performs each patch as its own merge-write, in order.
///
/// A failed write does not stop the others. If any failed, the result is
/// `PartialWrite` naming the failed barcodes; the successful ones stay.
pub(crate) async fn write_each<C: CartStore>(
    store: &C,
    user: &UserId,
    patches: &[LineItemPatch],
) -> AppResult<Vec<LineItem>> {
    let mut written = Vec::with_capacity(patches.len());
    let mut succeeded = Vec::new();
    let mut failed = Vec::new();

    for patch in patches {
        match store.merge_write(user, patch).await {
            Ok(line) => {
                debug!(user = %user, barcode = %patch.barcode, "Item write landed");
                succeeded.push(patch.barcode.clone());
                written.extend(line);
            }
            Err(err) => {
                warn!(user = %user, barcode = %patch.barcode, error = %err, "Item write failed");
                failed.push(FailedWrite::from_storage(patch.barcode.clone(), &err));
            }
        }
    }

    if failed.is_empty() {
        Ok(written)
    } else {
        Err(AppError::PartialWrite { succeeded, failed })
    }
}
