//! # UPI Payment Links
//!
//! Builds the `upi://pay` deep link the wallet app is launched with.
//!
//! ```text
//! upi://pay?pa=store@bank&pn=ExpressScan%20Store&am=540.00&cu=INR
//!           │            │                       │         │
//!           payee VPA    payee name              amount    currency
//! ```
//!
//! What the wallet does with the link is outside this crate; the shopper
//! confirms the payment afterwards.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::validation::validate_payment_amount;

pub const UPI_SCHEME: &str = "upi";
pub const UPI_CURRENCY: &str = "INR";

/// A payment request for one checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpiPaymentRequest {
    /// Payee virtual payment address, e.g. `store@paytm`.
    pub payee_vpa: String,
    /// Name shown in the wallet.
    pub payee_name: String,
    pub amount: Money,
    /// Optional note (`tn`), e.g. the order id.
    pub note: Option<String>,
}

impl UpiPaymentRequest {
    pub fn new(payee_vpa: impl Into<String>, payee_name: impl Into<String>, amount: Money) -> Self {
        UpiPaymentRequest {
            payee_vpa: payee_vpa.into(),
            payee_name: payee_name.into(),
            amount,
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Renders the deep link.
    ///
    /// ## Example
    /// ```rust
    /// use expressscan_core::money::Money;
    /// use expressscan_core::payment::UpiPaymentRequest;
    ///
    /// let link = UpiPaymentRequest::new("store@paytm", "ExpressScan Store", Money::from_rupees(540))
    ///     .to_link()
    ///     .unwrap();
    /// assert_eq!(
    ///     link.as_str(),
    ///     "upi://pay?pa=store%40paytm&pn=ExpressScan+Store&am=540.00&cu=INR"
    /// );
    /// ```
    pub fn to_link(&self) -> CoreResult<Url> {
        validate_payment_amount(self.amount)?;
        validate_vpa(&self.payee_vpa)?;

        let mut link = Url::parse("upi://pay").map_err(|e| {
            CoreError::Validation(ValidationError::InvalidFormat {
                field: "payment link".to_string(),
                reason: e.to_string(),
            })
        })?;

        {
            let mut query = link.query_pairs_mut();
            query
                .append_pair("pa", &self.payee_vpa)
                .append_pair("pn", &self.payee_name)
                .append_pair("am", &self.amount.to_decimal_string())
                .append_pair("cu", UPI_CURRENCY);
            if let Some(note) = &self.note {
                query.append_pair("tn", note);
            }
        }

        Ok(link)
    }
}

/// A VPA is `handle@provider`, both parts non-empty.
pub fn validate_vpa(vpa: &str) -> Result<(), ValidationError> {
    match vpa.split_once('@') {
        Some((handle, provider))
            if !handle.is_empty() && !provider.is_empty() && !provider.contains('@') =>
        {
            Ok(())
        }
        _ => Err(ValidationError::InvalidFormat {
            field: "upi_id".to_string(),
            reason: "expected handle@provider".to_string(),
        }),
    }
}
