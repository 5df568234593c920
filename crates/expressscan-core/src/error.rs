//! # Error Types
//!
//! Domain-specific error types for expressscan-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  expressscan-core errors (this file)                                   │
//! │  ├── CoreError        - General domain errors                          │
//! │  ├── OfferError       - Offer cannot be applied                        │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  expressscan-db errors (separate crate)                                │
//! │  └── DbError          - Cart store / order history failures            │
//! │                                                                         │
//! │  shopper app errors                                                    │
//! │  └── AppError         - What the presentation layer sees               │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → AppError → Front end              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The pricing engine itself never fails: it clamps instead. Errors only
//! come from planning a mutation (expired offer, unknown barcode, limits).

use chrono::NaiveDate;
use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The scanned barcode is not in the product catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// No offer with this id in the catalog.
    #[error("Offer not found: {0}")]
    OfferNotFound(String),

    /// The item is not in the cart.
    #[error("Item not in cart: {0}")]
    ItemNotInCart(String),

    /// Item quantity would exceed the maximum allowed.
    ///
    /// ## When This Occurs
    /// ```text
    /// Scan Milk (qty in cart: 999)
    ///      │
    ///      ▼
    /// QuantityTooLarge { barcode: "123456789012", requested: 1000, max: 999 }
    /// ```
    #[error("Quantity {requested} for {barcode} exceeds maximum allowed ({max})")]
    QuantityTooLarge {
        barcode: String,
        requested: i64,
        max: i64,
    },

    /// The offer cannot be applied.
    #[error(transparent)]
    Offer(#[from] OfferError),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Offer Error
// =============================================================================

/// Reasons an offer is rejected before any write happens.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OfferError {
    /// The offer's expiry date is before today.
    #[error("Offer {offer_id} expired on {expired_on}")]
    Expired {
        offer_id: String,
        expired_on: NaiveDate,
    },

    /// The offer has nothing to add (a combo or discount with no items).
    #[error("Offer {offer_id} has no items to add")]
    NoItems { offer_id: String },
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when input (scanner links, catalog files, quantities)
/// doesn't meet requirements.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., malformed barcode or link).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., two offers with one id).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
