//! # Cart Repository
//!
//! Cart lines for each user, one row per `(user_id, barcode)`.
//!
//! ## Write Path
//! ```text
//! merge_write(user, patch)
//!   │
//!   ├── lock notifier write gate
//!   ├── BEGIN
//!   │     SELECT row           ── absent ⇒ None
//!   │     patch.apply_to(row)  ── the one merge rule (expressscan-core)
//!   │     quantity > 0 ? UPSERT : DELETE
//!   ├── COMMIT                 ── any error before this leaves the row untouched
//!   └── publish get_all(user) to subscribers
//! ```

use std::sync::Arc;

use chrono::Utc;
use expressscan_core::money::Money;
use expressscan_core::planning::LineItemPatch;
use expressscan_core::types::{DiscountRate, LineItem, UserId};
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::DbResult;
use crate::store::CartStore;
use crate::subscription::{CartNotifier, CartSubscription};

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct CartItemRow {
    barcode: String,
    name: String,
    unit_price_paise: i64,
    quantity: i64,
    offer_quantity: i64,
    discount_rate_bps: Option<i64>,
    combo_price_paise: Option<i64>,
    applied_offer_id: Option<String>,
}

impl From<CartItemRow> for LineItem {
    fn from(row: CartItemRow) -> Self {
        LineItem {
            barcode: row.barcode,
            name: row.name,
            unit_price: Money::from_paise(row.unit_price_paise),
            quantity: row.quantity,
            offer_quantity: row.offer_quantity,
            discount_rate: row
                .discount_rate_bps
                .map(|bps| DiscountRate::from_bps(u32::try_from(bps.max(0)).unwrap_or(u32::MAX))),
            combo_price: row.combo_price_paise.map(Money::from_paise),
            applied_offer_id: row.applied_offer_id,
        }
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT barcode, name, unit_price_paise, quantity, offer_quantity,
           discount_rate_bps, combo_price_paise, applied_offer_id
    FROM cart_items
"#;

// =============================================================================
// Repository
// =============================================================================

/// Repository for cart lines.
#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
    notifier: Arc<CartNotifier>,
}

impl CartRepository {
    /// Creates a new CartRepository.
    pub fn new(pool: SqlitePool, notifier: Arc<CartNotifier>) -> Self {
        CartRepository { pool, notifier }
    }

    async fn fetch_all(&self, user: &UserId) -> DbResult<Vec<LineItem>> {
        let rows: Vec<CartItemRow> =
            sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE user_id = ?1 ORDER BY barcode"))
                .bind(user.as_str())
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(LineItem::from).collect())
    }

    /// Re-reads the cart and pushes it to subscribers. The write is already
    /// committed, so a failed read is logged rather than returned.
    async fn notify(&self, user: &UserId) {
        match self.fetch_all(user).await {
            Ok(snapshot) => {
                self.notifier.publish(user, snapshot).await;
            }
            Err(e) => warn!(user = %user, error = %e, "Could not read cart snapshot after write"),
        }
    }

    /// Removes every line of a user's cart in one transaction.
    pub async fn clear(&self, user: &UserId) -> DbResult<u64> {
        let _gate = self.notifier.lock_writes().await;

        let removed = sqlx::query("DELETE FROM cart_items WHERE user_id = ?1")
            .bind(user.as_str())
            .execute(&self.pool)
            .await?
            .rows_affected();

        debug!(user = %user, removed, "Cleared cart");
        self.notify(user).await;
        Ok(removed)
    }
}

impl CartStore for CartRepository {
    async fn get_all(&self, user: &UserId) -> DbResult<Vec<LineItem>> {
        self.fetch_all(user).await
    }

    async fn get(&self, user: &UserId, barcode: &str) -> DbResult<Option<LineItem>> {
        let row: Option<CartItemRow> =
            sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE user_id = ?1 AND barcode = ?2"))
                .bind(user.as_str())
                .bind(barcode)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(LineItem::from))
    }

    async fn merge_write(&self, user: &UserId, patch: &LineItemPatch) -> DbResult<Option<LineItem>> {
        let _gate = self.notifier.lock_writes().await;
        let mut tx = self.pool.begin().await?;

        let existing: Option<CartItemRow> =
            sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE user_id = ?1 AND barcode = ?2"))
                .bind(user.as_str())
                .bind(&patch.barcode)
                .fetch_optional(&mut *tx)
                .await?;

        let merged = patch.apply_to(existing.map(LineItem::from));

        let stored = if merged.quantity > 0 {
            sqlx::query(
                r#"
                INSERT INTO cart_items (
                    user_id, barcode, name, unit_price_paise, quantity, offer_quantity,
                    discount_rate_bps, combo_price_paise, applied_offer_id, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                ON CONFLICT (user_id, barcode) DO UPDATE SET
                    quantity          = excluded.quantity,
                    offer_quantity    = excluded.offer_quantity,
                    discount_rate_bps = excluded.discount_rate_bps,
                    combo_price_paise = excluded.combo_price_paise,
                    applied_offer_id  = excluded.applied_offer_id,
                    updated_at        = excluded.updated_at
                "#,
            )
            .bind(user.as_str())
            .bind(&merged.barcode)
            .bind(&merged.name)
            .bind(merged.unit_price.paise())
            .bind(merged.quantity)
            .bind(merged.offer_quantity)
            .bind(merged.discount_rate.map(|r| i64::from(r.bps())))
            .bind(merged.combo_price.map(|p| p.paise()))
            .bind(merged.applied_offer_id.as_deref())
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;
            Some(merged)
        } else {
            sqlx::query("DELETE FROM cart_items WHERE user_id = ?1 AND barcode = ?2")
                .bind(user.as_str())
                .bind(&patch.barcode)
                .execute(&mut *tx)
                .await?;
            None
        };

        tx.commit().await?;

        debug!(
            user = %user,
            barcode = %patch.barcode,
            quantity = stored.as_ref().map(|i| i.quantity).unwrap_or(0),
            "Merged cart line"
        );

        self.notify(user).await;
        Ok(stored)
    }

    async fn delete(&self, user: &UserId, barcode: &str) -> DbResult<()> {
        let _gate = self.notifier.lock_writes().await;

        let removed = sqlx::query("DELETE FROM cart_items WHERE user_id = ?1 AND barcode = ?2")
            .bind(user.as_str())
            .bind(barcode)
            .execute(&self.pool)
            .await?
            .rows_affected();

        debug!(user = %user, barcode = %barcode, removed, "Deleted cart line");
        self.notify(user).await;
        Ok(())
    }

    async fn subscribe(&self, user: &UserId) -> DbResult<CartSubscription> {
        let _gate = self.notifier.lock_writes().await;
        let initial = self.fetch_all(user).await?;
        Ok(self.notifier.subscribe(user, initial).await)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use expressscan_core::planning::{plan_quantity_adjustment, FieldUpdate, QuantityAdjustment};

    async fn carts() -> CartRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().carts()
    }

    fn milk(qty: i64) -> LineItemPatch {
        LineItemPatch::new("123456789012")
            .with_product("Milk", Money::from_rupees(30))
            .with_quantity(FieldUpdate::Increment(qty))
    }

    #[tokio::test]
    async fn test_merge_write_creates_and_accumulates() {
        let repo = carts().await;
        let user = UserId::new("u1");

        repo.merge_write(&user, &milk(1)).await.unwrap();
        let stored = repo.merge_write(&user, &milk(2)).await.unwrap().unwrap();

        assert_eq!(stored.quantity, 3);
        assert_eq!(repo.get(&user, "123456789012").await.unwrap(), Some(stored));
    }

    #[tokio::test]
    async fn test_offer_fields_round_trip() {
        let repo = carts().await;
        let user = UserId::new("u1");
        let patch = milk(2)
            .with_offer_quantity(FieldUpdate::Increment(2))
            .with_offer("1", Some(DiscountRate::from_bps(2000)), None);

        repo.merge_write(&user, &patch).await.unwrap();

        let item = repo.get(&user, "123456789012").await.unwrap().unwrap();
        assert_eq!(item.offer_quantity, 2);
        assert_eq!(item.discount_rate, Some(DiscountRate::from_bps(2000)));
        assert_eq!(item.combo_price, None);
        assert_eq!(item.applied_offer_id.as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_carts_are_per_user() {
        let repo = carts().await;
        let alice = UserId::new("alice");
        let bob = UserId::new("bob");

        repo.merge_write(&alice, &milk(1)).await.unwrap();

        assert_eq!(repo.get_all(&alice).await.unwrap().len(), 1);
        assert!(repo.get_all(&bob).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_all_ordered_by_barcode() {
        let repo = carts().await;
        let user = UserId::new("u1");

        for code in ["987654321098", "000111222333", "123456789012"] {
            let patch = LineItemPatch::new(code)
                .with_product("Item", Money::from_rupees(1))
                .with_quantity(FieldUpdate::Increment(1));
            repo.merge_write(&user, &patch).await.unwrap();
        }

        let codes: Vec<String> = repo
            .get_all(&user)
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.barcode)
            .collect();
        assert_eq!(codes, vec!["000111222333", "123456789012", "987654321098"]);
    }

    #[tokio::test]
    async fn test_decrement_to_zero_deletes_row() {
        let repo = carts().await;
        let user = UserId::new("u1");
        repo.merge_write(&user, &milk(2)).await.unwrap();

        let item = repo.get(&user, "123456789012").await.unwrap().unwrap();
        let adjustment = plan_quantity_adjustment(&item, -2).unwrap();
        assert_eq!(adjustment, QuantityAdjustment::Remove);
        repo.delete(&user, &item.barcode).await.unwrap();
        assert!(repo.get(&user, "123456789012").await.unwrap().is_none());

        // A relative merge that leaves no units deletes as well
        repo.merge_write(&user, &milk(1)).await.unwrap();
        let result = repo.merge_write(&user, &milk(-1)).await.unwrap();
        assert!(result.is_none());
        assert!(repo.get_all(&user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_absent_line_is_ok() {
        let repo = carts().await;
        repo.delete(&UserId::new("u1"), "nothing").await.unwrap();
    }

    #[tokio::test]
    async fn test_subscription_sees_every_write() {
        let repo = carts().await;
        let user = UserId::new("u1");

        let mut sub = repo.subscribe(&user).await.unwrap();
        assert!(sub.next().await.unwrap().is_empty());

        repo.merge_write(&user, &milk(1)).await.unwrap();
        repo.merge_write(&user, &milk(1)).await.unwrap();
        repo.delete(&user, "123456789012").await.unwrap();

        assert_eq!(sub.next().await.unwrap()[0].quantity, 1);
        assert_eq!(sub.next().await.unwrap()[0].quantity, 2);
        assert!(sub.next().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_subscription_starts_with_current_cart() {
        let repo = carts().await;
        let user = UserId::new("u1");
        repo.merge_write(&user, &milk(4)).await.unwrap();

        let mut sub = repo.subscribe(&user).await.unwrap();
        assert_eq!(sub.next().await.unwrap()[0].quantity, 4);
    }

    #[tokio::test]
    async fn test_clear() {
        let repo = carts().await;
        let user = UserId::new("u1");
        repo.merge_write(&user, &milk(1)).await.unwrap();

        assert_eq!(repo.clear(&user).await.unwrap(), 1);
        assert!(repo.get_all(&user).await.unwrap().is_empty());
    }
}
