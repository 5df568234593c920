//! # Offer Service
//!
//! Listing promotions and applying them to a cart.
//!
//! ## Applying an Offer
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  apply_offer(session, offer)                                           │
//! │       │                                                                 │
//! │       ├── no user?        → Unauthenticated      (nothing written)     │
//! │       ├── expired?        → OfferExpired         (nothing written)     │
//! │       ├── threshold?      → OfferOutcome::Automatic                    │
//! │       ├── over 999 units? → QuantityTooLarge     (nothing written)     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  one merge_write per constituent item, each its own unit of work       │
//! │       │                                                                 │
//! │       ├── all landed      → OfferOutcome::Applied { lines }            │
//! │       └── some failed     → PartialWrite { succeeded, failed }         │
//! │                               │                                         │
//! │                               ▼                                         │
//! │                  retry_offer_items(session, offer, failed barcodes)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Writes that landed are never undone. Retrying only the failed barcodes
//! completes the offer without adding the successful items twice.

use expressscan_core::offers::Offer;
use expressscan_core::planning::{plan_offer_application, LineItemPatch, OfferPlan};
use expressscan_core::types::LineItem;
use expressscan_core::CoreError;
use expressscan_db::CartStore;
use serde::Serialize;
use tracing::{debug, info};

use super::{check_limits, write_each, PricingContext};
use crate::error::AppResult;
use crate::session::Session;

/// What applying an offer did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "outcome")]
pub enum OfferOutcome {
    /// Threshold offers apply themselves on every recompute.
    Automatic { message: String },
    /// Every constituent item was written.
    Applied { lines: Vec<LineItem> },
}

/// Offer operations over any [`CartStore`].
#[derive(Debug, Clone)]
pub struct OfferService<C> {
    store: C,
    pricing: PricingContext,
}

impl<C: CartStore> OfferService<C> {
    pub fn new(store: C, pricing: PricingContext) -> Self {
        OfferService { store, pricing }
    }

    /// Offers that can still be applied today, in catalog order.
    pub fn active_offers(&self) -> Vec<Offer> {
        self.pricing
            .offers()
            .active(self.pricing.today())
            .cloned()
            .collect()
    }

    /// Looks an offer up by id, expired or not.
    pub fn offer(&self, id: &str) -> AppResult<&Offer> {
        Ok(self
            .pricing
            .offers()
            .get(id)
            .ok_or_else(|| CoreError::OfferNotFound(id.to_string()))?)
    }

    /// Applies a catalog offer by id.
    pub async fn apply_offer_id(&self, session: &Session, offer_id: &str) -> AppResult<OfferOutcome> {
        session.require_user()?;
        let offer = self.offer(offer_id)?.clone();
        self.apply_offer(session, &offer).await
    }

    /// Applies `offer` to the signed-in user's cart.
    ///
    /// Applying the same offer again accumulates: each constituent item gains
    /// the offer's quantity again, and the offer's pricing replaces whatever
    /// offer the line carried before.
    pub async fn apply_offer(&self, session: &Session, offer: &Offer) -> AppResult<OfferOutcome> {
        self.apply_items(session, offer, |_| true).await
    }

    /// Re-runs only the writes for `barcodes`, typically the `failed` list of
    /// a `PartialWrite`.
    pub async fn retry_offer_items(
        &self,
        session: &Session,
        offer: &Offer,
        barcodes: &[String],
    ) -> AppResult<OfferOutcome> {
        debug!(offer = %offer.id, ?barcodes, "Retrying failed offer items");
        self.apply_items(session, offer, |patch| barcodes.contains(&patch.barcode))
            .await
    }

    async fn apply_items(
        &self,
        session: &Session,
        offer: &Offer,
        include: impl Fn(&LineItemPatch) -> bool,
    ) -> AppResult<OfferOutcome> {
        let user = session.require_user()?;

        let patches: Vec<LineItemPatch> = match plan_offer_application(offer, self.pricing.today())? {
            OfferPlan::Automatic => {
                debug!(user = %user, offer = %offer.id, "Threshold offer needs no writes");
                return Ok(OfferOutcome::Automatic {
                    message: format!("{} is applied automatically at checkout", offer.title),
                });
            }
            OfferPlan::Writes(patches) => patches.into_iter().filter(|p| include(p)).collect(),
        };

        check_limits(&self.store, user, &patches).await?;
        let lines = write_each(&self.store, user, &patches).await?;

        info!(user = %user, offer = %offer.id, items = lines.len(), "Offer applied");
        Ok(OfferOutcome::Applied { lines })
    }
}
