//! Built-in store data: the launch promotions and sample carts.
//!
//! The shopper app falls back to [`offer_catalog`] when no catalog file is
//! configured. Tests across the workspace use the same data.

use chrono::NaiveDate;

use crate::money::Money;
use crate::offers::{Offer, OfferCatalog, OfferItem, OfferKind};
use crate::types::{DiscountRate, LineItem};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

fn offer_item(barcode: &str, name: &str, unit_price: Money, quantity: i64) -> OfferItem {
    OfferItem {
        barcode: barcode.to_string(),
        name: name.to_string(),
        unit_price,
        quantity,
    }
}

/// Milk + Cornflakes for ₹50 (was ₹70), until 2025-07-15.
pub fn milk_cornflakes_combo() -> Offer {
    Offer {
        id: "1".to_string(),
        kind: OfferKind::Combo,
        title: "Milk + Cornflakes Combo".to_string(),
        description: "Get Milk and Cornflakes together at a special price".to_string(),
        price: Money::from_rupees(50),
        old_price: Some(Money::from_rupees(70)),
        items: vec![
            offer_item("123456789012", "Milk", Money::from_rupees(30), 1),
            offer_item("000111222333", "Cornflakes", Money::from_rupees(40), 1),
        ],
        expiry_date: date(2025, 7, 15),
        threshold_discount_rate: None,
        threshold_min: None,
    }
}

/// Parle-G for ₹8 (was ₹10), until 2025-07-09.
pub fn parle_g_discount() -> Offer {
    Offer {
        id: "2".to_string(),
        kind: OfferKind::Discount,
        title: "Parle-G Biscuits".to_string(),
        description: "20% off on Parle-G".to_string(),
        price: Money::from_rupees(8),
        old_price: Some(Money::from_rupees(10)),
        items: vec![offer_item("8901058842029", "Parle-G Biscuits", Money::from_rupees(10), 1)],
        expiry_date: date(2025, 7, 9),
        threshold_discount_rate: None,
        threshold_min: None,
    }
}

/// Bread + Jam for ₹45 (was ₹65), until 2025-07-18.
pub fn bread_jam_combo() -> Offer {
    Offer {
        id: "3".to_string(),
        kind: OfferKind::Combo,
        title: "Bread + Jam Combo".to_string(),
        description: "Breakfast combo at a special price".to_string(),
        price: Money::from_rupees(45),
        old_price: Some(Money::from_rupees(65)),
        items: vec![
            offer_item("987654321098", "Bread", Money::from_rupees(25), 1),
            offer_item("123123123123", "Jam", Money::from_rupees(40), 1),
        ],
        expiry_date: date(2025, 7, 18),
        threshold_discount_rate: None,
        threshold_min: None,
    }
}

/// 10% off on carts of ₹500 or more, until 2025-07-30.
pub fn spend_threshold() -> Offer {
    Offer {
        id: "4".to_string(),
        kind: OfferKind::Threshold,
        title: "10% OFF on ₹500+".to_string(),
        description: "Applied automatically at checkout".to_string(),
        price: Money::zero(),
        old_price: None,
        items: Vec::new(),
        expiry_date: date(2025, 7, 30),
        threshold_discount_rate: Some(DiscountRate::from_bps(1000)),
        threshold_min: None,
    }
}

/// The four launch promotions.
pub fn offer_catalog() -> OfferCatalog {
    OfferCatalog {
        offers: vec![
            milk_cornflakes_combo(),
            parle_g_discount(),
            bread_jam_combo(),
            spend_threshold(),
        ],
    }
}

/// A cart mixing combo, discount and manual quantity that crosses ₹500.
///
/// ```text
/// Milk        ₹30 × 3  (1 via combo @ ₹25)
/// Cornflakes  ₹40 × 1  (1 via combo @ ₹25)
/// Parle-G     ₹10 × 5  (2 via 20% discount)
/// Eggs        ₹70 × 6  (manual)
/// subtotal = 85 + 25 + 50 + 420 = ₹580
/// ```
pub fn mixed_cart() -> Vec<LineItem> {
    vec![
        LineItem::new("123456789012", "Milk", Money::from_rupees(30))
            .with_quantity(3)
            .with_offer_quantity(1)
            .with_combo_price(Money::from_rupees(25)),
        LineItem::new("000111222333", "Cornflakes", Money::from_rupees(40))
            .with_quantity(1)
            .with_offer_quantity(1)
            .with_combo_price(Money::from_rupees(25)),
        LineItem::new("8901058842029", "Parle-G Biscuits", Money::from_rupees(10))
            .with_quantity(5)
            .with_offer_quantity(2)
            .with_discount_rate(DiscountRate::from_bps(2000)),
        LineItem::new("111122223333", "Eggs (Dozen)", Money::from_rupees(70)).with_quantity(6),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::{compute_cart, PricingRules};

    #[test]
    fn test_fixture_offers_are_valid() {
        let catalog = offer_catalog();
        for offer in catalog.offers() {
            offer.validate().unwrap();
        }
        assert!(OfferCatalog::new(catalog.offers().to_vec()).is_ok());
    }

    #[test]
    fn test_mixed_cart_totals() {
        let cart = compute_cart(&mixed_cart(), &PricingRules::default());

        assert_eq!(cart.subtotal, Money::from_rupees(580));
        assert!(cart.has_threshold);
        assert_eq!(cart.item_count, 15);

        // Milk: combo 1 × ₹5 + threshold 2 × ₹30 × 10% = ₹11
        assert_eq!(cart.line("123456789012").unwrap().discount, Money::from_rupees(11));
        // Parle-G: 2 × ₹10 × 20% + 3 × ₹10 × 10% = ₹7
        assert_eq!(cart.line("8901058842029").unwrap().discount, Money::from_rupees(7));
        // Eggs: 6 × ₹70 × 10% = ₹42
        assert_eq!(cart.line("111122223333").unwrap().final_price, Money::from_rupees(378));
    }
}
