//! # Offer Catalog
//!
//! Promotional offers and their validity windows.
//!
//! ## Offer Kinds
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Combo      Milk + Cornflakes for ₹50 (was ₹70)                         │
//! │             → each constituent gets combo_price = ₹50 / 2 = ₹25         │
//! │                                                                         │
//! │  Discount   Parle-G for ₹8 (was ₹10)                                    │
//! │             → discount_rate = (10 - 8) / 10 = 20%                       │
//! │                                                                         │
//! │  Threshold  10% off on ₹500+                                            │
//! │             → never applied by the shopper, evaluated every recompute   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Offers are immutable during a session. The catalog is loaded from a TOML
//! file or the built-in fixtures and filtered by expiry date at use time.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::DiscountRate;
use crate::validation;

/// Minimum cart subtotal for the spend-threshold rule (₹500.00).
pub const DEFAULT_THRESHOLD_MIN: Money = Money::from_rupees(500);

/// Rate of the spend-threshold rule (10%).
pub const DEFAULT_THRESHOLD_RATE: DiscountRate = DiscountRate::from_bps(1000);

// =============================================================================
// Offer Kind
// =============================================================================

/// The kind of promotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OfferKind {
    /// Bundle of distinct products sold at a fixed total price.
    Combo,
    /// Flat percentage off the listed products.
    Discount,
    /// Percentage off non-offer quantity once the cart crosses a spend line.
    Threshold,
}

// =============================================================================
// Offer Item
// =============================================================================

/// One product required to realise an offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OfferItem {
    pub barcode: String,
    pub name: String,
    pub unit_price: Money,
    /// Units added per application of the offer.
    pub quantity: i64,
}

// =============================================================================
// Offer
// =============================================================================

/// A promotional rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: OfferKind,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Bundle price (combo) or discounted unit price (discount).
    #[serde(default)]
    pub price: Money,
    /// Price before the promotion.
    #[serde(default)]
    pub old_price: Option<Money>,
    #[serde(default)]
    pub items: Vec<OfferItem>,
    /// Last day the offer can be applied.
    #[ts(as = "String")]
    pub expiry_date: NaiveDate,
    /// Threshold offers only: the rate applied to manual quantity.
    #[serde(default)]
    pub threshold_discount_rate: Option<DiscountRate>,
    /// Threshold offers only: the minimum subtotal. Defaults to ₹500.
    #[serde(default)]
    pub threshold_min: Option<Money>,
}

impl Offer {
    /// Whether the offer can no longer be applied on `today`.
    ///
    /// The expiry date itself is still a valid day.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiry_date < today
    }

    /// The fractional discount a discount-type offer attaches to its items:
    /// `(old_price - price) / old_price`.
    ///
    /// Zero when there is no old price or it is not above the offer price.
    pub fn discount_rate(&self) -> DiscountRate {
        match self.old_price {
            Some(old) if old > self.price => DiscountRate::from_ratio(old - self.price, old),
            _ => DiscountRate::zero(),
        }
    }

    /// Per-unit combo price: the bundle price split evenly across the combo's
    /// constituent items. Remainder paise are dropped.
    pub fn combo_unit_price(&self) -> Money {
        self.price.split_evenly(self.items.len() as i64)
    }

    /// `(minimum subtotal, rate)` of a threshold offer, `None` for other kinds.
    pub fn threshold_rule(&self) -> Option<(Money, DiscountRate)> {
        if self.kind != OfferKind::Threshold {
            return None;
        }
        Some((
            self.threshold_min.unwrap_or(DEFAULT_THRESHOLD_MIN),
            self.threshold_discount_rate.unwrap_or(DEFAULT_THRESHOLD_RATE),
        ))
    }

    /// Checks the offer definition is usable.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "offer.id".to_string(),
            });
        }

        match self.kind {
            OfferKind::Combo | OfferKind::Discount => {
                if self.items.is_empty() {
                    return Err(ValidationError::Required {
                        field: format!("offer {}: items", self.id),
                    });
                }
                if self.price.is_negative() {
                    return Err(ValidationError::MustBePositive {
                        field: format!("offer {}: price", self.id),
                    });
                }
                for item in &self.items {
                    validation::validate_barcode(&item.barcode)?;
                    validation::validate_quantity(item.quantity)?;
                    validation::validate_price(item.unit_price)?;
                }
            }
            OfferKind::Threshold => {
                if let Some(rate) = self.threshold_discount_rate {
                    validation::validate_rate(rate)?;
                }
            }
        }

        Ok(())
    }
}

// =============================================================================
// Offer Catalog
// =============================================================================

/// The externally defined list of offers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferCatalog {
    #[serde(default)]
    pub(crate) offers: Vec<Offer>,
}

impl OfferCatalog {
    /// Creates a catalog, validating every offer and rejecting duplicate ids.
    pub fn new(offers: Vec<Offer>) -> CoreResult<Self> {
        let mut seen = std::collections::HashSet::new();
        for offer in &offers {
            offer.validate()?;
            if !seen.insert(offer.id.as_str()) {
                return Err(CoreError::Validation(ValidationError::Duplicate {
                    field: "offer.id".to_string(),
                    value: offer.id.clone(),
                }));
            }
        }
        Ok(OfferCatalog { offers })
    }

    /// Parses a catalog from TOML (`[[offers]]` tables).
    ///
    /// ## Example
    /// ```rust
    /// use expressscan_core::offers::OfferCatalog;
    ///
    /// let catalog = OfferCatalog::from_toml_str(r#"
    ///     [[offers]]
    ///     id = "4"
    ///     type = "threshold"
    ///     title = "10% OFF on ₹500+"
    ///     expiryDate = "2025-07-30"
    ///     thresholdDiscountRate = 1000
    /// "#).unwrap();
    /// assert_eq!(catalog.len(), 1);
    /// ```
    pub fn from_toml_str(contents: &str) -> CoreResult<Self> {
        let parsed: OfferCatalog = toml::from_str(contents).map_err(|e| {
            CoreError::Validation(ValidationError::InvalidFormat {
                field: "offer catalog".to_string(),
                reason: e.to_string(),
            })
        })?;
        OfferCatalog::new(parsed.offers)
    }

    /// All offers, in catalog order.
    pub fn offers(&self) -> &[Offer] {
        &self.offers
    }

    /// Offers that can still be applied on `today`.
    pub fn active(&self, today: NaiveDate) -> impl Iterator<Item = &Offer> {
        self.offers.iter().filter(move |o| !o.is_expired(today))
    }

    /// Looks an offer up by id.
    pub fn get(&self, id: &str) -> Option<&Offer> {
        self.offers.iter().find(|o| o.id == id)
    }

    /// The first active threshold offer, if any.
    pub fn threshold_offer(&self, today: NaiveDate) -> Option<&Offer> {
        self.active(today).find(|o| o.kind == OfferKind::Threshold)
    }

    pub fn len(&self) -> usize {
        self.offers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
