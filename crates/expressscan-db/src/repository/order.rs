//! # Order Repository
//!
//! Checked-out carts. Uses the snapshot pattern: the priced lines are stored
//! as JSON exactly as they were at checkout, so later price or offer changes
//! never rewrite history.

use chrono::{DateTime, Utc};
use expressscan_core::money::Money;
use expressscan_core::pricing::PricedLineItem;
use expressscan_core::types::{Order, OrderStatus, PaymentMethod, UserId};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::store::OrderStore;

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: String,
    user_id: String,
    items_json: String,
    subtotal_paise: i64,
    discount_paise: i64,
    total_paise: i64,
    status: OrderStatus,
    method: PaymentMethod,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = DbError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let items: Vec<PricedLineItem> =
            serde_json::from_str(&row.items_json).map_err(|e| DbError::CorruptRecord {
                entity: "Order".to_string(),
                id: row.id.clone(),
                reason: e.to_string(),
            })?;

        Ok(Order {
            id: row.id,
            user_id: UserId::new(row.user_id),
            items,
            subtotal: Money::from_paise(row.subtotal_paise),
            discount: Money::from_paise(row.discount_paise),
            total: Money::from_paise(row.total_paise),
            status: row.status,
            method: row.method,
            created_at: row.created_at,
        })
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, user_id, items_json, subtotal_paise, discount_paise, total_paise,
           status, method, created_at
    FROM orders
"#;

/// Repository for order history.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }
}

impl OrderStore for OrderRepository {
    async fn save_order(&self, order: &Order) -> DbResult<()> {
        debug!(id = %order.id, user = %order.user_id, total = %order.total, "Saving order");

        let items_json = serde_json::to_string(&order.items)
            .map_err(|e| DbError::Internal(format!("Failed to encode order items: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, user_id, items_json, subtotal_paise, discount_paise, total_paise,
                status, method, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&order.id)
        .bind(order.user_id.as_str())
        .bind(items_json)
        .bind(order.subtotal.paise())
        .bind(order.discount.paise())
        .bind(order.total.paise())
        .bind(order.status)
        .bind(order.method)
        .bind(order.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_orders(&self, user: &UserId) -> DbResult<Vec<Order>> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "{SELECT_COLUMNS} WHERE user_id = ?1 ORDER BY created_at DESC, rowid DESC"
        ))
        .bind(user.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    async fn get_order(&self, user: &UserId, id: &str) -> DbResult<Option<Order>> {
        let row: Option<OrderRow> =
            sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE user_id = ?1 AND id = ?2"))
                .bind(user.as_str())
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(Order::try_from).transpose()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
