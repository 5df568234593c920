//! # Validation Module
//!
//! Input validation utilities for ExpressScan.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Scanner / front end                                          │
//! │  ├── Decodes the QR or barcode into a link or raw code                 │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Shopper services (Rust)                                      │
//! │  ├── Link parsing (parse_scan_link)                                    │
//! │  └── THIS MODULE: Business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── PRIMARY KEY (user_id, barcode)                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use expressscan_core::validation::{parse_scan_link, validate_quantity};
//!
//! let barcode = parse_scan_link("https://expressscan.web.app/?barcode=123456789012").unwrap();
//! assert_eq!(barcode, "123456789012");
//!
//! validate_quantity(5).unwrap();
//! ```

use url::Url;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{DiscountRate, UserId};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest barcode accepted (GS1 codes top out well below this).
pub const MAX_BARCODE_LEN: usize = 48;

/// Query parameter carrying the barcode in scanner deep links.
pub const SCAN_LINK_PARAM: &str = "barcode";

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product barcode.
///
/// ## Rules
/// - Must not be empty
/// - At most 48 characters
/// - ASCII letters and digits only
///
/// ## Example
/// ```rust
/// use expressscan_core::validation::validate_barcode;
///
/// assert!(validate_barcode("8901058842029").is_ok());
/// assert!(validate_barcode("").is_err());
/// assert!(validate_barcode("12 34").is_err());
/// ```
pub fn validate_barcode(barcode: &str) -> ValidationResult<()> {
    let barcode = barcode.trim();

    if barcode.is_empty() {
        return Err(ValidationError::Required {
            field: "barcode".to_string(),
        });
    }

    if barcode.len() > MAX_BARCODE_LEN {
        return Err(ValidationError::TooLong {
            field: "barcode".to_string(),
            max: MAX_BARCODE_LEN,
        });
    }

    if !barcode.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::InvalidFormat {
            field: "barcode".to_string(),
            reason: "must contain only letters and digits".to_string(),
        });
    }

    Ok(())
}

/// Validates the identifier handed over by the authentication collaborator
/// and wraps it.
///
/// Returns `Required` for a blank identifier, which the shopper app reports
/// as an unauthenticated caller.
pub fn validate_user_id(id: &str) -> ValidationResult<UserId> {
    let id = id.trim();

    if id.is_empty() {
        return Err(ValidationError::Required {
            field: "user_id".to_string(),
        });
    }

    if id.len() > 128 {
        return Err(ValidationError::TooLong {
            field: "user_id".to_string(),
            max: 128,
        });
    }

    Ok(UserId::new(id))
}

/// Extracts the barcode from a scanned code.
///
/// The store's QR codes are deep links of the form
/// `https://<store>/?barcode=<code>`; plain product barcodes are accepted
/// as-is.
///
/// ## Example
/// ```rust
/// use expressscan_core::validation::parse_scan_link;
///
/// assert_eq!(parse_scan_link("8901058842029").unwrap(), "8901058842029");
/// assert!(parse_scan_link("https://expressscan.web.app/").is_err());
/// ```
pub fn parse_scan_link(scanned: &str) -> ValidationResult<String> {
    let scanned = scanned.trim();

    if scanned.is_empty() {
        return Err(ValidationError::Required {
            field: "scan".to_string(),
        });
    }

    let Ok(link) = Url::parse(scanned) else {
        validate_barcode(scanned)?;
        return Ok(scanned.to_string());
    };

    let barcode = link
        .query_pairs()
        .find(|(key, _)| key == SCAN_LINK_PARAM)
        .map(|(_, value)| value.trim().to_string())
        .ok_or_else(|| ValidationError::InvalidFormat {
            field: "scan".to_string(),
            reason: format!("link has no '{}' parameter", SCAN_LINK_PARAM),
        })?;

    validate_barcode(&barcode)?;
    Ok(barcode)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Offer catalog load / reorder                                           │
/// │                                                                         │
/// │  Offer item quantity: 2                                                │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(2) ← THIS FUNCTION                                  │
/// │       │                                                                 │
/// │       ├── qty <= 0? → Error: "quantity must be positive"               │
/// │       │                                                                 │
/// │       ├── qty > 999? → Error: "quantity must be between 1 and 999"     │
/// │       │                                                                 │
/// │       └── OK                                                            │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (free items)
///
/// ## Example
/// ```rust
/// use expressscan_core::money::Money;
/// use expressscan_core::validation::validate_price;
///
/// assert!(validate_price(Money::from_paise(1099)).is_ok());
/// assert!(validate_price(Money::zero()).is_ok());
/// assert!(validate_price(Money::from_paise(-100)).is_err());
/// ```
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a discount rate.
///
/// ## Rules
/// - Must be between 0 and 10000 bps (0% to 100%)
pub fn validate_rate(rate: DiscountRate) -> ValidationResult<()> {
    if rate.bps() > 10000 {
        return Err(ValidationError::OutOfRange {
            field: "discount_rate".to_string(),
            min: 0,
            max: 10000,
        });
    }

    Ok(())
}

/// Validates a payable amount.
pub fn validate_payment_amount(amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "payment amount".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates cart size (number of distinct products) before a new line is
/// created.
///
/// ## Rules
/// - Must not exceed MAX_CART_ITEMS (100)
pub fn validate_cart_size(current_items: usize) -> ValidationResult<()> {
    if current_items >= MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "cart items".to_string(),
            min: 0,
            max: MAX_CART_ITEMS as i64,
        });
    }

    Ok(())
}

/// Validates that `new_items` more lines fit in a cart of `current_items`.
///
/// ## Rules
/// - `current_items + new_items` must not exceed MAX_CART_ITEMS (100)
/// - Adding no lines always passes
pub fn validate_cart_growth(current_items: usize, new_items: usize) -> ValidationResult<()> {
    if new_items == 0 {
        return Ok(());
    }
    validate_cart_size(current_items.saturating_add(new_items - 1))
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates an order id.
///
/// ## Example
/// ```rust
/// use expressscan_core::validation::validate_order_id;
///
/// assert!(validate_order_id("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_order_id("not-a-uuid").is_err());
/// ```
pub fn validate_order_id(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "order_id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "order_id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
