//! End-to-end service behaviour over an in-memory SQLite cart store.

mod common;

use common::*;
use expressscan_core::fixtures;
use expressscan_core::money::Money;
use expressscan_core::planning::{FieldUpdate, LineItemPatch};
use expressscan_core::MAX_CART_ITEMS;
use expressscan_core::types::UserId;
use expressscan_core::MAX_ITEM_QUANTITY;
use expressscan_db::CartStore;
use expressscan_shopper::error::{AppError, ErrorCode};
use expressscan_shopper::services::OfferOutcome;
use expressscan_shopper::session::Session;

// =============================================================================
// Offer application
// =============================================================================

#[tokio::test]
async fn test_anonymous_offer_is_rejected_before_any_write() {
    let db = database().await;
    let s = services(db.carts(), &db);

    let err = s
        .offers
        .apply_offer(&Session::anonymous(), &fixtures::milk_cornflakes_combo())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Unauthenticated));
    assert_eq!(err.code(), ErrorCode::Unauthenticated);
    assert!(db.carts().get_all(&UserId::new("uid-shopper")).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_expired_offer_writes_nothing() {
    let db = database().await;
    let s = services(db.carts(), &db);
    let session = shopper();

    // Parle-G ran until 2025-07-09
    let err = s
        .offers
        .apply_offer_id(&session, "2")
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::OfferExpired { ref offer_id, .. } if offer_id == "2"));
    assert!(s.carts.items(&session).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_offer_on_its_expiry_day_still_applies() {
    let db = database().await;
    let mut offer = fixtures::bread_jam_combo();
    offer.expiry_date = today();
    let s = services(db.carts(), &db);

    let outcome = s.offers.apply_offer(&shopper(), &offer).await.unwrap();
    assert!(matches!(outcome, OfferOutcome::Applied { ref lines } if lines.len() == 2));
}

#[tokio::test]
async fn test_applying_a_combo_twice_accumulates() {
    let db = database().await;
    let s = services(db.carts(), &db);
    let session = shopper();
    let combo = fixtures::milk_cornflakes_combo();

    s.offers.apply_offer(&session, &combo).await.unwrap();
    s.offers.apply_offer(&session, &combo).await.unwrap();

    for line in s.carts.items(&session).await.unwrap() {
        assert_eq!(line.quantity, 2, "{}", line.barcode);
        assert_eq!(line.offer_quantity, 2, "{}", line.barcode);
        assert_eq!(line.combo_price, Some(Money::from_rupees(25)));
        assert_eq!(line.applied_offer_id.as_deref(), Some("1"));
    }
}

#[tokio::test]
async fn test_combo_prices_each_item_at_its_share() {
    let db = database().await;
    let s = services(db.carts(), &db);
    let session = shopper();

    s.offers.apply_offer_id(&session, "1").await.unwrap();
    let cart = s.carts.view(&session).await.unwrap();

    assert_eq!(cart.subtotal, Money::from_rupees(50));
    assert_eq!(cart.line(MILK).unwrap().discount, Money::from_rupees(5));
    assert_eq!(cart.line(CORNFLAKES).unwrap().discount, Money::from_rupees(15));
    assert_eq!(cart.total, Money::from_rupees(50));
    assert!(!cart.has_threshold);
}

#[tokio::test]
async fn test_threshold_offer_is_automatic() {
    let db = database().await;
    let s = services(db.carts(), &db);
    let session = shopper();

    let outcome = s.offers.apply_offer_id(&session, "4").await.unwrap();

    assert!(matches!(outcome, OfferOutcome::Automatic { .. }));
    assert!(s.carts.items(&session).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_active_offers_exclude_expired() {
    let db = database().await;
    let s = services(db.carts(), &db);

    let ids: Vec<String> = s.offers.active_offers().into_iter().map(|o| o.id).collect();
    assert_eq!(ids, vec!["1", "3", "4"]);
}

#[tokio::test]
async fn test_unknown_offer_is_not_found() {
    let db = database().await;
    let s = services(db.carts(), &db);

    let err = s.offers.apply_offer_id(&shopper(), "99").await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);
}

// =============================================================================
// Scanning and quantities
// =============================================================================

#[tokio::test]
async fn test_scan_accepts_links_and_bare_barcodes() {
    let db = database().await;
    let s = services(db.carts(), &db);
    let session = shopper();

    s.carts
        .scan(&session, "https://expressscan.web.app/?barcode=123456789012")
        .await
        .unwrap();
    let line = s.carts.scan(&session, MILK).await.unwrap();

    assert_eq!(line.quantity, 2);
    assert_eq!(line.offer_quantity, 0);
    assert_eq!(line.name, "Milk");
}

#[tokio::test]
async fn test_scanning_an_unknown_product_fails() {
    let db = database().await;
    let s = services(db.carts(), &db);

    let err = s.carts.scan(&shopper(), "5000000000001").await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn test_decrement_to_zero_deletes_the_line() {
    let db = database().await;
    let s = services(db.carts(), &db);
    let session = shopper();

    s.offers.apply_offer_id(&session, "1").await.unwrap();
    let removed = s.carts.adjust_quantity(&session, MILK, -1).await.unwrap();

    assert!(removed.is_none());
    let barcodes: Vec<String> = s
        .carts
        .items(&session)
        .await
        .unwrap()
        .into_iter()
        .map(|l| l.barcode)
        .collect();
    assert_eq!(barcodes, vec![CORNFLAKES]);
}

#[tokio::test]
async fn test_decrement_below_offer_quantity_clamps_it() {
    let db = database().await;
    let s = services(db.carts(), &db);
    let session = shopper();
    let combo = fixtures::milk_cornflakes_combo();

    s.offers.apply_offer(&session, &combo).await.unwrap();
    s.offers.apply_offer(&session, &combo).await.unwrap();
    s.carts.scan(&session, MILK).await.unwrap();

    let milk = s.carts.adjust_quantity(&session, MILK, -2).await.unwrap().unwrap();

    assert_eq!(milk.quantity, 1);
    assert_eq!(milk.offer_quantity, 1);
    assert_eq!(milk.combo_price, Some(Money::from_rupees(25)));
}

#[tokio::test]
async fn test_increment_keeps_offer_quantity() {
    let db = database().await;
    let s = services(db.carts(), &db);
    let session = shopper();

    s.offers.apply_offer_id(&session, "3").await.unwrap();
    let bread = s.carts.adjust_quantity(&session, BREAD, 2).await.unwrap().unwrap();

    assert_eq!(bread.quantity, 3);
    assert_eq!(bread.offer_quantity, 1);
}

#[tokio::test]
async fn test_adjusting_a_missing_line_fails() {
    let db = database().await;
    let s = services(db.carts(), &db);

    let err = s.carts.adjust_quantity(&shopper(), EGGS, 1).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn test_quantity_limit_is_enforced() {
    let db = database().await;
    let s = services(db.carts(), &db);
    let session = shopper();

    s.carts.scan(&session, EGGS).await.unwrap();
    let err = s
        .carts
        .adjust_quantity(&session, EGGS, MAX_ITEM_QUANTITY)
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::LimitExceeded);
    assert_eq!(s.carts.items(&session).await.unwrap()[0].quantity, 1);
}

#[tokio::test]
async fn test_full_cart_rejects_offer_lines() {
    let db = database().await;
    let s = services(db.carts(), &db);
    let session = shopper();
    fill_cart(&db.carts(), &session, MAX_CART_ITEMS).await;

    let err = s.offers.apply_offer_id(&session, "1").await.unwrap_err();

    assert_eq!(err.code(), ErrorCode::ValidationError);
    assert_eq!(s.carts.items(&session).await.unwrap().len(), MAX_CART_ITEMS);
}

#[tokio::test]
async fn test_offer_needing_more_lines_than_fit_writes_nothing() {
    let db = database().await;
    let s = services(db.carts(), &db);
    let session = shopper();
    fill_cart(&db.carts(), &session, MAX_CART_ITEMS - 1).await;

    // Bread + Jam needs two new lines, only one fits
    let err = s.offers.apply_offer_id(&session, "3").await.unwrap_err();

    assert_eq!(err.code(), ErrorCode::ValidationError);
    let items = s.carts.items(&session).await.unwrap();
    assert_eq!(items.len(), MAX_CART_ITEMS - 1);
    assert!(items.iter().all(|l| l.barcode != BREAD && l.barcode != JAM));
}

#[tokio::test]
async fn test_offer_on_lines_already_in_a_full_cart_applies() {
    let db = database().await;
    let s = services(db.carts(), &db);
    let session = shopper();

    s.carts.scan(&session, BREAD).await.unwrap();
    s.carts.scan(&session, JAM).await.unwrap();
    fill_cart(&db.carts(), &session, MAX_CART_ITEMS - 2).await;

    s.offers.apply_offer_id(&session, "3").await.unwrap();
    assert_eq!(s.carts.items(&session).await.unwrap().len(), MAX_CART_ITEMS);
}

#[tokio::test]
async fn test_carts_are_per_user() {
    let db = database().await;
    let s = services(db.carts(), &db);
    let other = Session::signed_in("uid-other").unwrap();

    s.carts.scan(&shopper(), MILK).await.unwrap();

    assert!(s.carts.items(&other).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_remove_deletes_offer_metadata_too() {
    let db = database().await;
    let s = services(db.carts(), &db);
    let session = shopper();

    s.offers.apply_offer_id(&session, "1").await.unwrap();
    s.carts.remove(&session, MILK).await.unwrap();
    let line = s.carts.scan(&session, MILK).await.unwrap();

    assert_eq!(line.offer_quantity, 0);
    assert!(line.combo_price.is_none());
    assert!(line.applied_offer_id.is_none());
}

// =============================================================================
// Live pricing
// =============================================================================

#[tokio::test]
async fn test_watcher_sees_committed_writes() {
    let db = database().await;
    let s = services(db.carts(), &db);
    let session = shopper();

    let mut watcher = s.carts.watch(&session).await.unwrap();
    assert!(watcher.next().await.unwrap().is_empty());

    s.carts.scan(&session, EGGS).await.unwrap();
    let priced = watcher.next().await.unwrap();

    assert_eq!(priced.item_count, 1);
    assert_eq!(priced.total, Money::from_rupees(70));
}

#[tokio::test]
async fn test_anonymous_cannot_watch() {
    let db = database().await;
    let s = services(db.carts(), &db);

    assert!(matches!(
        s.carts.watch(&Session::anonymous()).await,
        Err(AppError::Unauthenticated)
    ));
}

// =============================================================================
// Checkout
// =============================================================================

#[tokio::test]
async fn test_payment_link_needs_items() {
    let db = database().await;
    let s = services(db.carts(), &db);

    let err = s.checkout.payment_link(&shopper()).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValidationError);
}

#[tokio::test]
async fn test_payment_link_carries_the_total() {
    let db = database().await;
    let s = services(db.carts(), &db);
    let session = shopper();

    s.offers.apply_offer_id(&session, "3").await.unwrap();
    let view = s.checkout.payment_link(&session).await.unwrap();

    assert_eq!(view.cart.total, Money::from_rupees(45));
    assert!(view.link.starts_with("upi://pay?pa=yourupiid%40paytm&pn=ExpressScan+Store&am=45.00&cu=INR"));
}

#[tokio::test]
async fn test_confirm_saves_order_and_empties_cart() {
    let db = database().await;
    let s = services(db.carts(), &db);
    let session = shopper();

    s.offers.apply_offer_id(&session, "1").await.unwrap();
    for _ in 0..6 {
        s.carts.scan(&session, EGGS).await.unwrap();
    }

    let receipt = s.checkout.confirm_payment(&session).await.unwrap();

    assert!(receipt.cart_cleared());
    assert_eq!(receipt.cleared.len(), 3);
    // 50 + 420 = 470, below the threshold
    assert_eq!(receipt.order.total, Money::from_rupees(470));
    assert!(s.carts.items(&session).await.unwrap().is_empty());

    let history = s.checkout.history(&session).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, receipt.order.id);
}

#[tokio::test]
async fn test_reorder_adds_manual_quantity() {
    let db = database().await;
    let s = services(db.carts(), &db);
    let session = shopper();

    s.offers.apply_offer_id(&session, "1").await.unwrap();
    let receipt = s.checkout.confirm_payment(&session).await.unwrap();

    let lines = s.checkout.reorder(&session, &receipt.order.id).await.unwrap();

    assert_eq!(lines.len(), 2);
    for line in &lines {
        assert_eq!(line.quantity, 1);
        assert_eq!(line.offer_quantity, 0);
        assert!(line.combo_price.is_none());
    }
    // Back at shelf price
    assert_eq!(s.carts.view(&session).await.unwrap().total, Money::from_rupees(70));
}

#[tokio::test]
async fn test_reorder_into_a_full_cart_is_rejected() {
    let db = database().await;
    let s = services(db.carts(), &db);
    let session = shopper();

    s.offers.apply_offer_id(&session, "1").await.unwrap();
    let receipt = s.checkout.confirm_payment(&session).await.unwrap();
    fill_cart(&db.carts(), &session, MAX_CART_ITEMS - 1).await;

    let err = s.checkout.reorder(&session, &receipt.order.id).await.unwrap_err();

    assert_eq!(err.code(), ErrorCode::ValidationError);
    assert_eq!(s.carts.items(&session).await.unwrap().len(), MAX_CART_ITEMS - 1);
}

#[tokio::test]
async fn test_unit_scanned_during_checkout_stays_in_cart() {
    let db = database().await;
    let store = FlakyCartStore::new(db.carts());
    let s = services(store.clone(), &db);
    let session = shopper();

    s.offers.apply_offer_id(&session, "1").await.unwrap();
    store.interleave_before_next_write(
        LineItemPatch::new(MILK).with_quantity(FieldUpdate::Increment(1)),
    );

    let receipt = s.checkout.confirm_payment(&session).await.unwrap();

    assert!(receipt.cart_cleared());
    assert_eq!(receipt.order.total, Money::from_rupees(50));
    let left = s.carts.items(&session).await.unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].barcode, MILK);
    assert_eq!(left[0].quantity, 1);
    assert_eq!(left[0].offer_quantity, 0);
    assert_eq!(s.carts.view(&session).await.unwrap().total, Money::from_rupees(30));
}

#[tokio::test]
async fn test_reorder_of_someone_elses_order_is_not_found() {
    let db = database().await;
    let s = services(db.carts(), &db);
    let session = shopper();

    s.carts.scan(&session, MILK).await.unwrap();
    let receipt = s.checkout.confirm_payment(&session).await.unwrap();

    let other = Session::signed_in("uid-other").unwrap();
    let err = s.checkout.reorder(&other, &receipt.order.id).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);
}
