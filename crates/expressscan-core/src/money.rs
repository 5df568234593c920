//! # Money Module
//!
//! Provides the `Money` type for handling rupee amounts safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  For the cart threshold this matters:                                   │
//! │    is 499.99 + 0.01 >= 500 ?  (depends on summation order!)            │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Paise                                            │
//! │    49999 + 1 = 50000 paise, always, in any order                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use expressscan_core::money::Money;
//!
//! let price = Money::from_paise(3000); // ₹30.00
//! let doubled = price * 2;             // ₹60.00
//! let total = price + Money::from_rupees(10); // ₹40.00
//! assert_eq!(total.paise(), 4000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::types::DiscountRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in paise (1/100 of an Indian rupee).
///
/// ## Design Decisions
/// - **i64 (signed)**: a combo priced above the shelf price produces a
///   negative discount, so intermediate values may go below zero
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Serde**: serialises as a bare integer, which is what the cart
///   documents store
///
/// ## Where Money is Used
/// ```text
/// LineItem.unit_price ──┬──► gross (unit × qty) ──► subtotal ──► threshold?
///                       │
///                       └──► discount ──► final_price ──► total ──► UPI link
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from paise (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use expressscan_core::money::Money;
    ///
    /// let price = Money::from_paise(1099); // ₹10.99
    /// assert_eq!(price.paise(), 1099);
    /// ```
    #[inline]
    pub const fn from_paise(paise: i64) -> Self {
        Money(paise)
    }

    /// Creates a Money value from whole rupees.
    #[inline]
    pub const fn from_rupees(rupees: i64) -> Self {
        Money(rupees * 100)
    }

    /// Creates a Money value from rupees and paise.
    ///
    /// For negative amounts only the rupee part carries the sign:
    /// `from_rupees_paise(-5, 50)` is -₹5.50.
    #[inline]
    pub const fn from_rupees_paise(rupees: i64, paise: i64) -> Self {
        if rupees < 0 {
            Money(rupees * 100 - paise)
        } else {
            Money(rupees * 100 + paise)
        }
    }

    /// Returns the value in paise.
    #[inline]
    pub const fn paise(&self) -> i64 {
        self.0
    }

    /// Returns the whole-rupee portion.
    #[inline]
    pub const fn rupees(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the paise portion (always 0-99).
    #[inline]
    pub const fn paise_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use expressscan_core::money::Money;
    ///
    /// let unit_price = Money::from_rupees(10);
    /// assert_eq!(unit_price.multiply_quantity(3).paise(), 3000);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Returns the portion of this amount given by `rate`, rounded to the
    /// nearest paisa (half away from zero).
    ///
    /// ## Implementation
    /// Integer math on basis points: `(amount × bps ± 5000) / 10000`.
    /// i128 keeps large carts from overflowing the intermediate product.
    ///
    /// ## Example
    /// ```rust
    /// use expressscan_core::money::Money;
    /// use expressscan_core::types::DiscountRate;
    ///
    /// let gross = Money::from_rupees(30);          // 3 × ₹10
    /// let rate = DiscountRate::from_bps(2000);     // 20%
    /// assert_eq!(gross.portion(rate).paise(), 600); // ₹6.00
    /// ```
    pub fn portion(&self, rate: DiscountRate) -> Money {
        let scaled = self.0 as i128 * rate.bps() as i128;
        let rounded = if scaled >= 0 {
            (scaled + 5000) / 10000
        } else {
            (scaled - 5000) / 10000
        };
        Money(rounded as i64)
    }

    /// Applies a percentage discount and returns the discounted amount.
    ///
    /// ## Example
    /// ```rust
    /// use expressscan_core::money::Money;
    /// use expressscan_core::types::DiscountRate;
    ///
    /// let subtotal = Money::from_rupees(600);
    /// let discounted = subtotal.apply_discount(DiscountRate::from_bps(1000));
    /// assert_eq!(discounted, Money::from_rupees(540));
    /// ```
    pub fn apply_discount(&self, rate: DiscountRate) -> Money {
        *self - self.portion(rate)
    }

    /// Splits the amount evenly into `parts`, dropping any remainder paise.
    ///
    /// A `parts` of zero returns the amount unchanged.
    pub const fn split_evenly(&self, parts: i64) -> Money {
        if parts <= 0 {
            return *self;
        }
        Money(self.0 / parts)
    }

    /// Formats the amount as a plain decimal with two places (`"50.00"`),
    /// the format payment links expect.
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}{}.{:02}", sign, self.rupees().abs(), self.paise_part())
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows money as `₹10.99`.
///
/// ## Note
/// This is for logs and receipts. The mobile front end formats its own
/// amounts for display.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}₹{}.{:02}",
            sign,
            self.rupees().abs(),
            self.paise_part()
        )
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
