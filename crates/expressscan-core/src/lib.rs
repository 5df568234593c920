//! # expressscan-core: Pure Cart Pricing Logic for ExpressScan
//!
//! This crate is the **heart** of ExpressScan. It prices carts, decides what
//! an offer or a quantity change writes, and builds payment links, all as
//! pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       ExpressScan Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Mobile front end                             │   │
//! │  │    Scan ──► Cart ──► Offers ──► Checkout (UPI) ──► Orders       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    apps/shopper                                 │   │
//! │  │    session, cart/offer/checkout services, CartWatcher           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │            ★ expressscan-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐          │   │
//! │  │   │ pricing  │ │  offers  │ │ planning │ │ payment  │          │   │
//! │  │   │ compute_ │ │ catalog, │ │ patches, │ │ upi://   │          │   │
//! │  │   │ cart     │ │ expiry   │ │ clamps   │ │ links    │          │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘          │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              expressscan-db (Cart Store adapter)                │   │
//! │  │         SQLite cart lines, orders, change subscriptions         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (LineItem, Order, Product, DiscountRate, UserId)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`pricing`] - The two-pass pricing engine
//! - [`offers`] - Offer definitions and the offer catalog
//! - [`planning`] - Merge-writes for offers, quantity changes, scans, reorders
//! - [`catalog`] - Barcode to product lookup
//! - [`payment`] - UPI deep links
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//! - [`fixtures`] - Built-in offers and sample carts
//!
//! ## Example Usage
//!
//! ```rust
//! use expressscan_core::fixtures;
//! use expressscan_core::pricing::{compute_cart, PricingRules};
//!
//! let cart = compute_cart(&fixtures::mixed_cart(), &PricingRules::default());
//! assert!(cart.has_threshold);
//! assert_eq!(cart.total.paise(), 52500); // ₹525.00
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod catalog;
pub mod error;
pub mod fixtures;
pub mod money;
pub mod offers;
pub mod payment;
pub mod planning;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, OfferError, ValidationError};
pub use money::Money;
pub use offers::{Offer, OfferCatalog, OfferKind};
pub use pricing::{compute_cart, PricedCart, PricedLineItem, PricingRules};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct products in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single item in cart
///
/// ## Business Reason
/// Prevents accidental over-ordering from a stuck scanner or a held +1
/// button.
pub const MAX_ITEM_QUANTITY: i64 = 999;
