//! # Checkout Service
//!
//! Payment link, payment confirmation, order history and reorder.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  payment_link(session)                                                  │
//! │    price cart ──► upi://pay?pa=<vpa>&pn=<store>&am=<total>&cu=INR       │
//! │                        │                                                │
//! │                        ▼  (wallet app, outside this crate)              │
//! │  confirm_payment(session)                                               │
//! │    1. price cart again (what the shopper sees is what is stored)        │
//! │    2. save Order { status: paid, method: upi }                          │
//! │    3. take the paid units out of each cart line, one by one             │
//! │       ├── units added after pricing stay in the cart                    │
//! │       └── failures are listed on the receipt, the order stays saved     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use expressscan_core::payment::UpiPaymentRequest;
use expressscan_core::planning::{plan_paid_removal, plan_reorder};
use expressscan_core::pricing::PricedCart;
use expressscan_core::types::{LineItem, Order, OrderStatus, PaymentMethod};
use expressscan_core::validation::validate_order_id;
use expressscan_core::ValidationError;
use expressscan_db::{CartStore, DbError, OrderStore};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::{check_limits, write_each, PricingContext};
use crate::config::StoreSettings;
use crate::error::{AppError, AppResult, FailedWrite};
use crate::session::Session;

/// A priced cart with the link that pays for it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequestView {
    pub cart: PricedCart,
    pub link: String,
}

/// The saved order and what happened to the cart afterwards.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutReceipt {
    pub order: Order,
    /// Lines whose paid units were removed from the cart.
    pub cleared: Vec<String>,
    /// Lines still holding paid units because their write failed.
    pub not_cleared: Vec<FailedWrite>,
}

impl CheckoutReceipt {
    pub fn cart_cleared(&self) -> bool {
        self.not_cleared.is_empty()
    }
}

/// Checkout operations over a cart store and an order store.
#[derive(Debug, Clone)]
pub struct CheckoutService<C, O> {
    carts: C,
    orders: O,
    store: StoreSettings,
    pricing: PricingContext,
}

impl<C: CartStore, O: OrderStore> CheckoutService<C, O> {
    pub fn new(carts: C, orders: O, store: StoreSettings, pricing: PricingContext) -> Self {
        CheckoutService {
            carts,
            orders,
            store,
            pricing,
        }
    }

    async fn priced_cart(&self, session: &Session) -> AppResult<PricedCart> {
        let user = session.require_user()?;
        let items = self.carts.get_all(user).await?;
        let priced = self.pricing.price(&items);
        if priced.is_empty() {
            return Err(ValidationError::Required {
                field: "cart items".to_string(),
            }
            .into());
        }
        Ok(priced)
    }

    /// Prices the cart and builds the UPI deep link for its total.
    pub async fn payment_link(&self, session: &Session) -> AppResult<PaymentRequestView> {
        let priced = self.priced_cart(session).await?;
        let link = UpiPaymentRequest::new(&self.store.upi_id, &self.store.name, priced.total)
            .with_note(format!("{} order", self.store.name))
            .to_link()?;

        info!(total = %priced.total, items = priced.item_count, "Payment link built");
        Ok(PaymentRequestView {
            cart: priced,
            link: link.to_string(),
        })
    }

    /// Records the paid order and empties the cart.
    ///
    /// The order is saved before the cart is touched. Each line then loses
    /// exactly the units the order paid for, as its own write; the ones that
    /// fail are reported on the receipt.
    pub async fn confirm_payment(&self, session: &Session) -> AppResult<CheckoutReceipt> {
        let user = session.require_user()?;
        let priced = self.priced_cart(session).await?;

        let order = Order {
            id: Uuid::new_v4().to_string(),
            user_id: user.clone(),
            subtotal: priced.subtotal,
            discount: priced.discount_total,
            total: priced.total,
            status: OrderStatus::Paid,
            method: PaymentMethod::Upi,
            created_at: Utc::now(),
            items: priced.items,
        };
        self.orders.save_order(&order).await?;
        info!(user = %user, order = %order.id, total = %order.total, "Order saved");

        let mut cleared = Vec::new();
        let mut not_cleared = Vec::new();
        for line in &order.items {
            let barcode = &line.item.barcode;
            match self.carts.merge_write(user, &plan_paid_removal(&line.item)).await {
                Ok(None) => cleared.push(barcode.clone()),
                Ok(Some(left)) => {
                    info!(
                        user = %user,
                        barcode = %barcode,
                        quantity = left.quantity,
                        "Unpaid units kept in cart"
                    );
                    cleared.push(barcode.clone());
                }
                Err(err) => {
                    warn!(user = %user, barcode = %barcode, error = %err, "Cart line not cleared");
                    not_cleared.push(FailedWrite::from_storage(barcode.clone(), &err));
                }
            }
        }

        Ok(CheckoutReceipt {
            order,
            cleared,
            not_cleared,
        })
    }

    /// The user's orders, newest first.
    pub async fn history(&self, session: &Session) -> AppResult<Vec<Order>> {
        let user = session.require_user()?;
        Ok(self.orders.list_orders(user).await?)
    }

    /// Puts every line of a past order back into the cart as manual quantity.
    pub async fn reorder(&self, session: &Session, order_id: &str) -> AppResult<Vec<LineItem>> {
        let user = session.require_user()?;
        validate_order_id(order_id)?;

        let order = self
            .orders
            .get_order(user, order_id)
            .await?
            .ok_or_else(|| AppError::Storage(DbError::not_found("Order", order_id)))?;

        let patches = plan_reorder(&order);
        check_limits(&self.carts, user, &patches).await?;
        let lines = write_each(&self.carts, user, &patches).await?;

        info!(user = %user, order = %order_id, items = lines.len(), "Order added back to cart");
        Ok(lines)
    }
}
