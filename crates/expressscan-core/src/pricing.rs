//! # Pricing Engine
//!
//! Turns the raw line items of a cart into per-item discounts, final prices
//! and a cart total.
//!
//! ## Two Passes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Pass 1: subtotal                                                       │
//! │    for each item:                                                       │
//! │      combo_price set and offer_qty > 0                                  │
//! │        ? combo_price × offer_qty + unit_price × manual_qty              │
//! │        : unit_price × quantity                                          │
//! │    has_threshold = subtotal >= ₹500                                     │
//! │                                                                         │
//! │  Pass 2: discount / final price (each item independently)               │
//! │    discount  = offer discount      (discount_rate wins over combo)      │
//! │              + threshold discount  (manual quantity only)               │
//! │    final     = clamp(unit_price × quantity - discount, 0, ..)           │
//! │                                                                         │
//! │  total = Σ final,  item_count = Σ quantity                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Threshold eligibility is decided once per recompute from the subtotal of
//! pass 1, never from the discounted total, so the threshold cannot feed
//! back into itself.
//!
//! The engine is a pure function of its input: every amount is integer
//! paise, so recomputing the same snapshot is bit-identical and the item
//! order does not matter.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::offers::{OfferCatalog, DEFAULT_THRESHOLD_MIN, DEFAULT_THRESHOLD_RATE};
use crate::types::{DiscountRate, LineItem};

// =============================================================================
// Pricing Rules
// =============================================================================

/// The spend-threshold rule evaluated on every recompute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdRule {
    /// Subtotal at or above which the rule applies.
    pub min_subtotal: Money,
    /// Rate applied to the manual quantity of every item.
    pub rate: DiscountRate,
}

/// Cart-wide rules that are not attached to individual line items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingRules {
    pub threshold: Option<ThresholdRule>,
}

impl PricingRules {
    /// Rules with no threshold discount at all.
    pub const fn without_threshold() -> Self {
        PricingRules { threshold: None }
    }

    /// Rules with the given threshold.
    pub const fn with_threshold(min_subtotal: Money, rate: DiscountRate) -> Self {
        PricingRules {
            threshold: Some(ThresholdRule { min_subtotal, rate }),
        }
    }

    /// Derives the rules from the offer catalog as of `today`.
    ///
    /// An active threshold offer overrides the threshold parameters. With
    /// none active the standing ₹500 / 10% rule applies.
    pub fn from_catalog(catalog: &OfferCatalog, today: NaiveDate) -> Self {
        match catalog.threshold_offer(today).and_then(|o| o.threshold_rule()) {
            Some((min_subtotal, rate)) => PricingRules::with_threshold(min_subtotal, rate),
            None => PricingRules::default(),
        }
    }
}

impl Default for PricingRules {
    /// 10% off manual quantity on carts of ₹500 or more.
    fn default() -> Self {
        PricingRules::with_threshold(DEFAULT_THRESHOLD_MIN, DEFAULT_THRESHOLD_RATE)
    }
}

// =============================================================================
// Priced Cart
// =============================================================================

/// A line item annotated with its discount and final price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PricedLineItem {
    #[serde(flatten)]
    pub item: LineItem,
    /// Total discount on this line (offer + threshold). Negative when a
    /// combo price is above the shelf price.
    pub discount: Money,
    /// `unit_price × quantity - discount`, never below zero.
    pub final_price: Money,
}

/// The result of pricing one cart snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PricedCart {
    pub items: Vec<PricedLineItem>,
    /// Pre-discount subtotal used for the threshold decision.
    pub subtotal: Money,
    /// Sum of all line discounts.
    pub discount_total: Money,
    /// Amount payable.
    pub total: Money,
    /// Total units in the cart.
    pub item_count: i64,
    pub has_threshold: bool,
}

impl PricedCart {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Finds a priced line by barcode.
    pub fn line(&self, barcode: &str) -> Option<&PricedLineItem> {
        self.items.iter().find(|l| l.item.barcode == barcode)
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Prices a cart snapshot.
///
/// Total for any input: offer quantity outside `[0, quantity]` is normalised
/// and final prices are clamped at zero rather than failing.
///
/// ## Example
/// ```rust
/// use expressscan_core::money::Money;
/// use expressscan_core::pricing::{compute_cart, PricingRules};
/// use expressscan_core::types::LineItem;
///
/// let items = vec![LineItem::new("1", "Rice", Money::from_rupees(100)).with_quantity(6)];
/// let cart = compute_cart(&items, &PricingRules::default());
///
/// assert!(cart.has_threshold);                  // ₹600 >= ₹500
/// assert_eq!(cart.total, Money::from_rupees(540)); // 10% off manual units
/// ```
pub fn compute_cart(items: &[LineItem], rules: &PricingRules) -> PricedCart {
    let subtotal: Money = items.iter().map(subtotal_contribution).sum();

    let threshold = rules
        .threshold
        .filter(|rule| subtotal >= rule.min_subtotal);

    let priced: Vec<PricedLineItem> = items.iter().map(|item| price_item(item, threshold)).collect();

    let total = priced.iter().map(|p| p.final_price).sum();
    let discount_total = priced.iter().map(|p| p.discount).sum();
    let item_count = items.iter().map(|i| i.quantity.max(0)).sum();

    PricedCart {
        items: priced,
        subtotal,
        discount_total,
        total,
        item_count,
        has_threshold: threshold.is_some(),
    }
}

/// Pass 1: an item's share of the pre-discount subtotal.
fn subtotal_contribution(item: &LineItem) -> Money {
    let offer_qty = item.offer_qty();
    let manual_qty = item.manual_qty();

    let offer_part = match item.combo_price {
        Some(combo) if offer_qty > 0 => combo.multiply_quantity(offer_qty),
        _ => item.unit_price.multiply_quantity(offer_qty),
    };

    offer_part + item.unit_price.multiply_quantity(manual_qty)
}

/// Pass 2: one item's discount and final price.
fn price_item(item: &LineItem, threshold: Option<ThresholdRule>) -> PricedLineItem {
    let offer_qty = item.offer_qty();
    let manual_qty = item.manual_qty();

    let mut discount = offer_discount(item, offer_qty);

    if let Some(rule) = threshold {
        if manual_qty > 0 {
            discount += item.unit_price.multiply_quantity(manual_qty).portion(rule.rate);
        }
    }

    let gross = item.gross();
    let mut final_price = gross - discount;
    if final_price.is_negative() {
        final_price = Money::zero();
        discount = gross;
    }

    PricedLineItem {
        item: item.clone(),
        discount,
        final_price,
    }
}

/// Discount earned by the offer-linked units. A discount rate takes
/// precedence over a combo price when a record carries both.
fn offer_discount(item: &LineItem, offer_qty: i64) -> Money {
    if offer_qty <= 0 {
        return Money::zero();
    }

    if let Some(rate) = item.discount_rate {
        return item.unit_price.multiply_quantity(offer_qty).portion(rate);
    }

    if let Some(combo) = item.combo_price {
        return (item.unit_price - combo).multiply_quantity(offer_qty);
    }

    Money::zero()
}

// =============================================================================
// Unit Tests
// =============================================================================
