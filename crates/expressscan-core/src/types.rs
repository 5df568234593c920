//! # Domain Types
//!
//! Core domain types shared by the pricing engine, the store adapter and the
//! shopper app.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    LineItem     │   │     Order       │   │    Product      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  barcode (key)  │   │  id (UUID)      │   │  barcode        │       │
//! │  │  unit_price     │   │  items (priced) │   │  name           │       │
//! │  │  quantity       │   │  total          │   │  unit_price     │       │
//! │  │  offer_quantity │   │  status, method │   └─────────────────┘       │
//! │  │  discount_rate? │   └─────────────────┘                             │
//! │  │  combo_price?   │                                                    │
//! │  └─────────────────┘   ┌─────────────────┐   ┌─────────────────┐       │
//! │                        │  DiscountRate   │   │     UserId      │       │
//! │                        │  bps (u32)      │   │  opaque token   │       │
//! │                        │  2000 = 20%     │   │  (phone number) │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A cart is not a type of its own: it is always the current set of
//! `LineItem`s for one user, priced fresh by [`crate::pricing::compute_cart`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;
use crate::pricing::PricedLineItem;

// =============================================================================
// Discount Rate
// =============================================================================

/// A fractional discount in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000, so a rate of 0.2 is 2000 bps and the
/// 10% threshold rule is 1000 bps. Integer rates keep every recompute
/// bit-identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DiscountRate(u32);

impl DiscountRate {
    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        DiscountRate(bps)
    }

    /// Creates a rate from a percentage (for configuration convenience).
    pub fn from_percentage(pct: f64) -> Self {
        DiscountRate((pct * 100.0).round().max(0.0) as u32)
    }

    /// Creates the rate `part / whole`, rounded to the nearest basis point.
    ///
    /// Returns a zero rate when `whole` is not positive or `part` is negative.
    ///
    /// ## Example
    /// ```rust
    /// use expressscan_core::money::Money;
    /// use expressscan_core::types::DiscountRate;
    ///
    /// // ₹2 off ₹10 is 20%
    /// let rate = DiscountRate::from_ratio(Money::from_rupees(2), Money::from_rupees(10));
    /// assert_eq!(rate.bps(), 2000);
    /// ```
    pub fn from_ratio(part: Money, whole: Money) -> Self {
        if !whole.is_positive() || part.is_negative() {
            return DiscountRate::zero();
        }
        let bps = (part.paise() as i128 * 10000 + whole.paise() as i128 / 2) / whole.paise() as i128;
        DiscountRate(bps.min(u32::MAX as i128) as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero rate.
    #[inline]
    pub const fn zero() -> Self {
        DiscountRate(0)
    }

    /// Checks if the rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for DiscountRate {
    fn default() -> Self {
        DiscountRate::zero()
    }
}

impl fmt::Display for DiscountRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percentage())
    }
}

// =============================================================================
// User Identity
// =============================================================================

/// Opaque identifier of the signed-in shopper.
///
/// The authentication collaborator issues it (the source app uses the
/// verified phone number). Every cart operation takes it explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UserId(String);

impl UserId {
    /// Wraps an identifier. Use [`crate::validation::validate_user_id`] for
    /// untrusted input.
    pub fn new(id: impl Into<String>) -> Self {
        UserId(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product the scanner can resolve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Barcode (EAN-13, UPC-A, ...). Primary key within a cart.
    pub barcode: String,

    /// Display name.
    pub name: String,

    /// Shelf price.
    pub unit_price: Money,
}

// =============================================================================
// Line Item
// =============================================================================

/// One product's aggregate state in a cart, as stored.
///
/// ## Quantity Split
/// ```text
///   quantity ──────────────────────────────────┐
///   ├── offer_quantity  (added through offers)  │  priced at combo/discount
///   └── manual quantity (scanned / +1 button)   │  eligible for threshold
/// ```
///
/// ## Invariants
/// - `0 <= offer_quantity <= quantity`
/// - at most one of `discount_rate` / `combo_price` drives the offer discount
///   (the last applied offer overwrites both fields)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub barcode: String,
    pub name: String,
    pub unit_price: Money,
    pub quantity: i64,
    #[serde(default)]
    pub offer_quantity: i64,
    #[serde(default)]
    pub discount_rate: Option<DiscountRate>,
    #[serde(default)]
    pub combo_price: Option<Money>,
    #[serde(default)]
    pub applied_offer_id: Option<String>,
}

impl LineItem {
    /// Creates an empty line item (quantity 0) for a product.
    pub fn new(barcode: impl Into<String>, name: impl Into<String>, unit_price: Money) -> Self {
        LineItem {
            barcode: barcode.into(),
            name: name.into(),
            unit_price,
            quantity: 0,
            offer_quantity: 0,
            discount_rate: None,
            combo_price: None,
            applied_offer_id: None,
        }
    }

    /// Creates an empty line item from a catalog product.
    pub fn from_product(product: &Product) -> Self {
        LineItem::new(product.barcode.clone(), product.name.clone(), product.unit_price)
    }

    /// Builder: sets the total quantity.
    pub fn with_quantity(mut self, quantity: i64) -> Self {
        self.quantity = quantity;
        self
    }

    /// Builder: sets the offer-linked quantity.
    pub fn with_offer_quantity(mut self, offer_quantity: i64) -> Self {
        self.offer_quantity = offer_quantity;
        self
    }

    /// Builder: attaches a flat discount rate.
    pub fn with_discount_rate(mut self, rate: DiscountRate) -> Self {
        self.discount_rate = Some(rate);
        self
    }

    /// Builder: attaches a per-unit combo price.
    pub fn with_combo_price(mut self, price: Money) -> Self {
        self.combo_price = Some(price);
        self
    }

    /// Units attributed to an applied offer, normalised into `[0, quantity]`.
    pub fn offer_qty(&self) -> i64 {
        self.offer_quantity.clamp(0, self.quantity.max(0))
    }

    /// Units added manually (scanned or incremented).
    pub fn manual_qty(&self) -> i64 {
        self.quantity.max(0) - self.offer_qty()
    }

    /// Gross value before any discount (`unit_price × quantity`).
    pub fn gross(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity.max(0))
    }

    /// Whether the stored record satisfies `0 <= offer_quantity <= quantity`.
    pub fn is_consistent(&self) -> bool {
        self.quantity >= 0 && (0..=self.quantity).contains(&self.offer_quantity)
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// The status of a checked-out order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Payment link was opened but not yet confirmed.
    #[default]
    Pending,
    /// The shopper confirmed the payment.
    Paid,
}

// =============================================================================
// Payment Method
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// UPI wallet app invoked through a deep link.
    #[default]
    Upi,
}

// =============================================================================
// Order
// =============================================================================

/// A checked-out cart.
/// Uses the snapshot pattern: the priced lines are frozen at checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub user_id: UserId,
    pub items: Vec<PricedLineItem>,
    pub subtotal: Money,
    pub discount: Money,
    pub total: Money,
    pub status: OrderStatus,
    pub method: PaymentMethod,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Total number of units in the order.
    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|i| i.item.quantity).sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
