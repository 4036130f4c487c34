//! Order query repository
//!
//! Projections that select exactly the columns the order responses need.
//! Nothing here builds an entity.

use chrono::NaiveDateTime;
use sqlx::PgPool;

use crate::error::DatabaseError;

const SUMMARY_COLUMNS: &str = r#"
    o.order_id,
    m.name,
    o.order_date,
    o.status AS order_status,
    d.city,
    d.street,
    d.zipcode
"#;

const SUMMARY_JOINS: &str = r#"
    FROM orders o
    JOIN members m ON m.member_id = o.member_id
    JOIN deliveries d ON d.delivery_id = o.delivery_id
"#;

const LINE_COLUMNS: &str = "oi.order_id, i.name AS item_name, oi.order_price, oi.count";

/// Repository for order DTO projections
#[derive(Debug, Clone)]
pub struct OrderQueryRepository {
    pool: PgPool,
}

impl OrderQueryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// One summary per order: member name, date, status, delivery address
    pub async fn find_summaries(&self) -> Result<Vec<OrderSummaryRow>, DatabaseError> {
        let sql = format!("SELECT {SUMMARY_COLUMNS} {SUMMARY_JOINS} ORDER BY o.order_id");
        let rows = sqlx::query_as::<_, OrderSummaryRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Lines of one order with the item name
    pub async fn find_lines(&self, order_id: i64) -> Result<Vec<OrderLineRow>, DatabaseError> {
        let sql = format!(
            "SELECT {LINE_COLUMNS} FROM order_items oi JOIN items i ON i.item_id = oi.item_id \
             WHERE oi.order_id = $1 ORDER BY oi.order_item_id"
        );
        let rows = sqlx::query_as::<_, OrderLineRow>(&sql)
            .bind(order_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Lines of many orders in one query
    pub async fn find_lines_in(&self, order_ids: &[i64]) -> Result<Vec<OrderLineRow>, DatabaseError> {
        let sql = format!(
            "SELECT {LINE_COLUMNS} FROM order_items oi JOIN items i ON i.item_id = oi.item_id \
             WHERE oi.order_id = ANY($1) ORDER BY oi.order_id, oi.order_item_id"
        );
        let rows = sqlx::query_as::<_, OrderLineRow>(&sql)
            .bind(order_ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Orders joined with their lines and items, one row per line
    ///
    /// Orders without lines do not appear.
    pub async fn find_flat(&self) -> Result<Vec<OrderFlatRow>, DatabaseError> {
        let sql = format!(
            "SELECT {SUMMARY_COLUMNS}, i.name AS item_name, oi.order_price, oi.count \
             {SUMMARY_JOINS} \
             JOIN order_items oi ON oi.order_id = o.order_id \
             JOIN items i ON i.item_id = oi.item_id \
             ORDER BY o.order_id, oi.order_item_id"
        );
        let rows = sqlx::query_as::<_, OrderFlatRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}

// ============================================================================
// Row types
// ============================================================================

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderSummaryRow {
    pub order_id: i64,
    pub name: String,
    pub order_date: NaiveDateTime,
    pub order_status: String,
    pub city: Option<String>,
    pub street: Option<String>,
    pub zipcode: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderLineRow {
    pub order_id: i64,
    pub item_name: String,
    pub order_price: i32,
    pub count: i32,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderFlatRow {
    #[sqlx(flatten)]
    pub summary: OrderSummaryRow,
    pub item_name: String,
    pub order_price: i32,
    pub count: i32,
}
