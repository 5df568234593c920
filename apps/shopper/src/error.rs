//! # Application Error Types
//!
//! What the presentation layer sees when a cart operation fails.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Handling Flow                                  │
//! │                                                                         │
//! │  Service call (apply_offer, adjust_quantity, checkout ...)             │
//! │       │                                                                 │
//! │       ├── no signed-in user ──────────► AppError::Unauthenticated      │
//! │       ├── plan rejected (CoreError) ──► AppError::OfferExpired / Core  │
//! │       ├── store failed (DbError) ─────► AppError::Storage              │
//! │       └── some item writes failed ────► AppError::PartialWrite         │
//! │                                                                         │
//! │  AppError ──► ApiError { code, message, retryable, failed }            │
//! │                 (serialised for the front end)                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here is rolled back: a `PartialWrite` lists exactly which
//! barcodes did not land so the caller can retry those alone.

use chrono::NaiveDate;
use expressscan_core::{CoreError, OfferError};
use expressscan_db::DbError;
use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;

// =============================================================================
// Failed Write
// =============================================================================

/// One item write that did not land.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedWrite {
    pub barcode: String,
    pub message: String,
    /// Whether repeating this write may succeed.
    pub retryable: bool,
}

impl FailedWrite {
    pub fn from_storage(barcode: impl Into<String>, err: &DbError) -> Self {
        FailedWrite {
            barcode: barcode.into(),
            message: err.to_string(),
            retryable: err.is_retryable(),
        }
    }
}

// =============================================================================
// App Error
// =============================================================================

/// Errors returned by the shopper services.
#[derive(Debug, Error)]
pub enum AppError {
    /// A cart-mutating operation was attempted without a user identity.
    #[error("Sign in to use the cart")]
    Unauthenticated,

    /// The offer's expiry date has passed. Nothing was written.
    #[error("Offer {offer_id} expired on {expired_on}")]
    OfferExpired {
        offer_id: String,
        expired_on: NaiveDate,
    },

    /// Some item writes succeeded and some failed. Nothing was rolled back.
    #[error("{} of {} item writes failed", .failed.len(), .succeeded.len() + .failed.len())]
    PartialWrite {
        /// Barcodes whose write landed.
        succeeded: Vec<String>,
        failed: Vec<FailedWrite>,
    },

    /// The cart store or order history failed.
    #[error(transparent)]
    Storage(#[from] DbError),

    /// A business rule rejected the operation.
    #[error(transparent)]
    Core(CoreError),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Expiry gets its own variant; every other core error stays wrapped.
impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Offer(OfferError::Expired {
                offer_id,
                expired_on,
            }) => AppError::OfferExpired {
                offer_id,
                expired_on,
            },
            other => AppError::Core(other),
        }
    }
}

impl From<OfferError> for AppError {
    fn from(err: OfferError) -> Self {
        AppError::from(CoreError::from(err))
    }
}

impl From<expressscan_core::ValidationError> for AppError {
    fn from(err: expressscan_core::ValidationError) -> Self {
        AppError::Core(CoreError::Validation(err))
    }
}

impl AppError {
    /// Machine-readable code for the front end.
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Unauthenticated => ErrorCode::Unauthenticated,
            AppError::OfferExpired { .. } => ErrorCode::OfferExpired,
            AppError::PartialWrite { .. } => ErrorCode::PartialWrite,
            AppError::Storage(DbError::NotFound { .. }) => ErrorCode::NotFound,
            AppError::Storage(_) => ErrorCode::StorageError,
            AppError::Core(err) => match err {
                CoreError::ProductNotFound(_)
                | CoreError::OfferNotFound(_)
                | CoreError::ItemNotInCart(_) => ErrorCode::NotFound,
                CoreError::QuantityTooLarge { .. } => ErrorCode::LimitExceeded,
                CoreError::Offer(_) => ErrorCode::OfferUnavailable,
                CoreError::Validation(_) => ErrorCode::ValidationError,
            },
            AppError::Config(_) => ErrorCode::ConfigError,
        }
    }

    /// Whether the front end should offer a retry.
    pub fn retryable(&self) -> bool {
        match self {
            AppError::PartialWrite { failed, .. } => failed.iter().any(|f| f.retryable),
            AppError::Storage(err) => err.is_retryable(),
            _ => false,
        }
    }

    /// Barcodes a `PartialWrite` did not write.
    pub fn failed_barcodes(&self) -> Vec<String> {
        match self {
            AppError::PartialWrite { failed, .. } => {
                failed.iter().map(|f| f.barcode.clone()).collect()
            }
            _ => Vec::new(),
        }
    }
}

/// Convenience type alias for shopper results.
pub type AppResult<T> = Result<T, AppError>;

// =============================================================================
// API Error (wire form)
// =============================================================================

/// Error as serialised for the front end.
///
/// ```json
/// {
///   "code": "PARTIAL_WRITE",
///   "message": "1 of 2 item writes failed",
///   "retryable": true,
///   "failed": [{ "barcode": "000111222333", "message": "...", "retryable": true }]
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    pub retryable: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<FailedWrite>,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// No signed-in user
    Unauthenticated,

    /// Offer past its expiry date
    OfferExpired,

    /// Offer cannot be applied for another reason (no items)
    OfferUnavailable,

    /// Some item writes of a multi-item operation failed
    PartialWrite,

    /// Product, offer, cart line or order not found
    NotFound,

    /// Input validation failed
    ValidationError,

    /// Item quantity limit reached
    LimitExceeded,

    /// Cart store or order history failed
    StorageError,

    /// Configuration could not be loaded
    ConfigError,
}

impl From<&AppError> for ApiError {
    fn from(err: &AppError) -> Self {
        let message = match err {
            AppError::Storage(db) if !matches!(db, DbError::NotFound { .. }) => {
                // Log the actual error but return a generic message
                tracing::error!(error = %db, "Cart storage failed");
                if db.is_retryable() {
                    "Could not reach your cart. Please try again.".to_string()
                } else {
                    "Cart storage failed".to_string()
                }
            }
            AppError::Config(cfg) => {
                tracing::error!(error = %cfg, "Configuration failed");
                err.to_string()
            }
            _ => err.to_string(),
        };

        let failed = match err {
            AppError::PartialWrite { failed, .. } => {
                tracing::error!(failed = failed.len(), "Multi-item write partially failed");
                failed.clone()
            }
            _ => Vec::new(),
        };

        ApiError {
            code: err.code(),
            message,
            retryable: err.retryable(),
            failed,
        }
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError::from(&err)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expired_offer_gets_own_variant() {
        let err: AppError = CoreError::Offer(OfferError::Expired {
            offer_id: "2".to_string(),
            expired_on: NaiveDate::from_ymd_opt(2025, 7, 9).unwrap(),
        })
        .into();

        assert!(matches!(err, AppError::OfferExpired { ref offer_id, .. } if offer_id == "2"));
        assert_eq!(err.code(), ErrorCode::OfferExpired);
        assert!(!err.retryable());
    }

    #[test]
    fn test_partial_write_lists_failures() {
        let err = AppError::PartialWrite {
            succeeded: vec!["123456789012".to_string()],
            failed: vec![FailedWrite {
                barcode: "000111222333".to_string(),
                message: "Query failed: disk I/O error".to_string(),
                retryable: true,
            }],
        };

        assert_eq!(err.to_string(), "1 of 2 item writes failed");
        assert_eq!(err.failed_barcodes(), vec!["000111222333".to_string()]);
        assert!(err.retryable());

        let json = serde_json::to_value(ApiError::from(&err)).unwrap();
        assert_eq!(json["code"], "PARTIAL_WRITE");
        assert_eq!(json["retryable"], true);
        assert_eq!(json["failed"][0]["barcode"], "000111222333");
    }

    #[test]
    fn test_storage_message_is_generic() {
        let err = AppError::Storage(DbError::QueryFailed("disk I/O error".to_string()));
        let api = ApiError::from(&err);

        assert_eq!(api.code, ErrorCode::StorageError);
        assert!(api.retryable);
        assert!(!api.message.contains("disk"));
    }

    #[test]
    fn test_codes_serialize_screaming_snake() {
        let json = serde_json::to_string(&ErrorCode::Unauthenticated).unwrap();
        assert_eq!(json, "\"UNAUTHENTICATED\"");
        let json = serde_json::to_string(&ErrorCode::LimitExceeded).unwrap();
        assert_eq!(json, "\"LIMIT_EXCEEDED\"");
    }

    #[test]
    fn test_not_found_mapping() {
        let err: AppError = CoreError::ProductNotFound("999".to_string()).into();
        assert_eq!(err.code(), ErrorCode::NotFound);
        let json = serde_json::to_value(ApiError::from(err)).unwrap();
        assert!(json.get("failed").is_none());
    }
}
