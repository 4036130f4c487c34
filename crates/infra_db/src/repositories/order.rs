//! Order repository implementation
//!
//! Entity-level access to orders and everything around them: members,
//! deliveries, items and order lines. Each fetch method issues one statement,
//! so the fetch strategies built on top can be compared by how many of these
//! methods they call.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;

use domain_order::{ItemDraft, ItemKind, MemberDraft, OrderDraft, OrderSearch, MAX_SEARCH_RESULTS};

use crate::error::DatabaseError;

/// Order header columns plus the joined member and delivery
const ORDER_JOIN_COLUMNS: &str = r#"
    o.order_id,
    o.member_id,
    o.delivery_id,
    o.order_date,
    o.status,
    m.name AS member_name,
    m.city AS member_city,
    m.street AS member_street,
    m.zipcode AS member_zipcode,
    d.city AS delivery_city,
    d.street AS delivery_street,
    d.zipcode AS delivery_zipcode,
    d.status AS delivery_status
"#;

const ORDER_JOINS: &str = r#"
    FROM orders o
    JOIN members m ON m.member_id = o.member_id
    JOIN deliveries d ON d.delivery_id = o.delivery_id
"#;

/// Line and item columns for the full graph join
const LINE_JOIN_COLUMNS: &str = r#"
    oi.order_item_id,
    oi.item_id,
    oi.order_price,
    oi.count,
    i.dtype,
    i.name AS item_name,
    i.price,
    i.stock_quantity,
    i.author,
    i.isbn,
    i.artist,
    i.etc,
    i.director,
    i.actor
"#;

const LINE_JOINS: &str = r#"
    LEFT JOIN order_items oi ON oi.order_id = o.order_id
    LEFT JOIN items i ON i.item_id = oi.item_id
"#;

const ITEM_COLUMNS: &str =
    "item_id, dtype, name, price, stock_quantity, author, isbn, artist, etc, director, actor";

/// Repository for orders and the entities they reference
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    /// Creates a new OrderRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ========================================================================
    // Order roots
    // ========================================================================

    /// Finds order headers matching the search, capped at 1000 rows
    ///
    /// Members are joined only to filter by name; no association is fetched.
    pub async fn search(&self, search: &OrderSearch) -> Result<Vec<OrderRow>, DatabaseError> {
        let mut builder = QueryBuilder::<Postgres>::new(
            "SELECT o.order_id, o.member_id, o.delivery_id, o.order_date, o.status \
             FROM orders o JOIN members m ON m.member_id = o.member_id WHERE 1 = 1",
        );

        if let Some(status) = search.order_status {
            builder.push(" AND o.status = ");
            builder.push_bind(status.as_str());
        }
        if let Some(name) = search.member_name_filter() {
            builder.push(" AND m.name LIKE ");
            builder.push_bind(format!("%{}%", escape_like(name)));
        }
        builder.push(" ORDER BY o.order_id LIMIT ");
        builder.push_bind(i64::from(MAX_SEARCH_RESULTS));

        let rows = builder
            .build_query_as::<OrderRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Fetches orders with member and delivery joined, optionally windowed
    ///
    /// # Arguments
    ///
    /// * `window` - `(offset, limit)`; `None` returns every order
    pub async fn find_with_member_delivery(
        &self,
        window: Option<(i64, i64)>,
    ) -> Result<Vec<OrderJoinRow>, DatabaseError> {
        let sql = format!(
            "SELECT {ORDER_JOIN_COLUMNS} {ORDER_JOINS} ORDER BY o.order_id LIMIT $1 OFFSET $2"
        );
        let (offset, limit) = match window {
            Some((offset, limit)) => (offset, Some(limit)),
            None => (0, None),
        };

        let rows = sqlx::query_as::<_, OrderJoinRow>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Fetches every order with its whole graph in one join
    ///
    /// Returns one row per order line, so an order appears once per line; an
    /// order without lines appears once with the line columns null.
    pub async fn find_graphs(&self) -> Result<Vec<OrderGraphRow>, DatabaseError> {
        let sql = format!(
            "SELECT {ORDER_JOIN_COLUMNS}, {LINE_JOIN_COLUMNS} {ORDER_JOINS} {LINE_JOINS} \
             ORDER BY o.order_id, oi.order_item_id"
        );
        let rows = sqlx::query_as::<_, OrderGraphRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Fetches one order's whole graph in one join
    pub async fn find_graph(&self, order_id: i64) -> Result<Vec<OrderGraphRow>, DatabaseError> {
        let sql = format!(
            "SELECT {ORDER_JOIN_COLUMNS}, {LINE_JOIN_COLUMNS} {ORDER_JOINS} {LINE_JOINS} \
             WHERE o.order_id = $1 ORDER BY oi.order_item_id"
        );
        let rows = sqlx::query_as::<_, OrderGraphRow>(&sql)
            .bind(order_id)
            .fetch_all(&self.pool)
            .await?;

        if rows.is_empty() {
            return Err(DatabaseError::not_found("Order", order_id));
        }
        Ok(rows)
    }

    // ========================================================================
    // Single associations
    // ========================================================================

    pub async fn find_member(&self, member_id: i64) -> Result<MemberRow, DatabaseError> {
        sqlx::query_as::<_, MemberRow>(
            "SELECT member_id, name, city, street, zipcode FROM members WHERE member_id = $1",
        )
        .bind(member_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Member", member_id))
    }

    pub async fn find_delivery(&self, delivery_id: i64) -> Result<DeliveryRow, DatabaseError> {
        sqlx::query_as::<_, DeliveryRow>(
            "SELECT delivery_id, city, street, zipcode, status \
             FROM deliveries WHERE delivery_id = $1",
        )
        .bind(delivery_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Delivery", delivery_id))
    }

    pub async fn find_item(&self, item_id: i64) -> Result<ItemRow, DatabaseError> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE item_id = $1");
        sqlx::query_as::<_, ItemRow>(&sql)
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Item", item_id))
    }

    // ========================================================================
    // Collections
    // ========================================================================

    /// Lines of one order, items not joined
    pub async fn find_order_items(&self, order_id: i64) -> Result<Vec<OrderItemRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, OrderItemRow>(
            "SELECT order_item_id, order_id, item_id, order_price, count \
             FROM order_items WHERE order_id = $1 ORDER BY order_item_id",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Lines of many orders in one `IN`-style query
    pub async fn find_order_items_in(
        &self,
        order_ids: &[i64],
    ) -> Result<Vec<OrderItemRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, OrderItemRow>(
            "SELECT order_item_id, order_id, item_id, order_price, count \
             FROM order_items WHERE order_id = ANY($1) ORDER BY order_item_id",
        )
        .bind(order_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn find_items_in(&self, item_ids: &[i64]) -> Result<Vec<ItemRow>, DatabaseError> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE item_id = ANY($1) ORDER BY item_id");
        let rows = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(item_ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    // ========================================================================
    // Writes
    // ========================================================================

    pub async fn insert_member(&self, member: &MemberDraft) -> Result<i64, DatabaseError> {
        let member_id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO members (name, city, street, zipcode) \
             VALUES ($1, $2, $3, $4) RETURNING member_id",
        )
        .bind(&member.name)
        .bind(&member.address.city)
        .bind(&member.address.street)
        .bind(&member.address.zipcode)
        .fetch_one(&self.pool)
        .await?;
        Ok(member_id)
    }

    pub async fn insert_item(&self, item: &ItemDraft) -> Result<i64, DatabaseError> {
        let columns = KindColumns::from(&item.kind);
        let item_id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO items \
             (dtype, name, price, stock_quantity, author, isbn, artist, etc, director, actor) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING item_id",
        )
        .bind(item.kind.dtype())
        .bind(&item.name)
        .bind(item.price)
        .bind(item.stock_quantity)
        .bind(columns.author)
        .bind(columns.isbn)
        .bind(columns.artist)
        .bind(columns.etc)
        .bind(columns.director)
        .bind(columns.actor)
        .fetch_one(&self.pool)
        .await?;
        Ok(item_id)
    }

    /// Stores a validated order: delivery, header, lines and stock
    ///
    /// Stock is taken with a guarded decrement per item, in item id order. If
    /// any decrement matches no row the whole transaction is rolled back with
    /// `ConcurrentUpdate`.
    pub async fn insert_order(
        &self,
        member_id: i64,
        draft: &OrderDraft,
    ) -> Result<i64, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let delivery_id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO deliveries (city, street, zipcode, status) \
             VALUES ($1, $2, $3, $4) RETURNING delivery_id",
        )
        .bind(&draft.delivery.address.city)
        .bind(&draft.delivery.address.street)
        .bind(&draft.delivery.address.zipcode)
        .bind(draft.delivery.status.as_str())
        .fetch_one(&mut *tx)
        .await?;

        let order_id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO orders (member_id, delivery_id, order_date, status) \
             VALUES ($1, $2, $3, $4) RETURNING order_id",
        )
        .bind(member_id)
        .bind(delivery_id)
        .bind(draft.order_date)
        .bind(draft.status.as_str())
        .fetch_one(&mut *tx)
        .await?;

        let mut taken: BTreeMap<i64, i32> = BTreeMap::new();
        for line in &draft.lines {
            sqlx::query(
                "INSERT INTO order_items (order_id, item_id, order_price, count) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(order_id)
            .bind(line.item_id.value())
            .bind(line.order_price)
            .bind(line.count)
            .execute(&mut *tx)
            .await?;
            *taken.entry(line.item_id.value()).or_default() += line.count;
        }

        for (item_id, quantity) in taken {
            let updated = sqlx::query(
                "UPDATE items SET stock_quantity = stock_quantity - $1 \
                 WHERE item_id = $2 AND stock_quantity >= $1",
            )
            .bind(quantity)
            .bind(item_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if updated == 0 {
                return Err(DatabaseError::ConcurrentUpdate(format!(
                    "stock of item {item_id} changed while placing the order"
                )));
            }
        }

        tx.commit().await?;
        debug!(order_id, delivery_id, "Order inserted");
        Ok(order_id)
    }

    /// Marks an order cancelled and returns stock to its items
    ///
    /// # Arguments
    ///
    /// * `restock` - `(item_id, quantity)` pairs to add back
    pub async fn cancel_order(
        &self,
        order_id: i64,
        restock: &[(i64, i32)],
    ) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        // The delivery row is share-locked so it cannot complete mid-cancel
        let updated = sqlx::query(
            "UPDATE orders SET status = 'CANCEL' \
             WHERE order_id = $1 AND status = 'ORDER' \
               AND EXISTS ( \
                   SELECT 1 FROM deliveries d \
                   WHERE d.delivery_id = orders.delivery_id AND d.status = 'READY' \
                   FOR SHARE \
               )",
        )
        .bind(order_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(DatabaseError::ConcurrentUpdate(format!(
                "order {order_id} or its delivery changed while cancelling"
            )));
        }

        for (item_id, quantity) in restock {
            sqlx::query("UPDATE items SET stock_quantity = stock_quantity + $1 WHERE item_id = $2")
                .bind(quantity)
                .bind(item_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

/// Escapes `LIKE` wildcards so a name filter matches literally
fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Kind-specific item columns, null where the kind does not use them
#[derive(Debug, Default)]
struct KindColumns<'a> {
    author: Option<&'a str>,
    isbn: Option<&'a str>,
    artist: Option<&'a str>,
    etc: Option<&'a str>,
    director: Option<&'a str>,
    actor: Option<&'a str>,
}

impl<'a> From<&'a ItemKind> for KindColumns<'a> {
    fn from(kind: &'a ItemKind) -> Self {
        match kind {
            ItemKind::Book { author, isbn } => KindColumns {
                author: author.as_deref(),
                isbn: isbn.as_deref(),
                ..Default::default()
            },
            ItemKind::Album { artist, etc } => KindColumns {
                artist: artist.as_deref(),
                etc: etc.as_deref(),
                ..Default::default()
            },
            ItemKind::Movie { director, actor } => KindColumns {
                director: director.as_deref(),
                actor: actor.as_deref(),
                ..Default::default()
            },
        }
    }
}

// ============================================================================
// Row types
// ============================================================================

/// Database row for an order header
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderRow {
    pub order_id: i64,
    pub member_id: i64,
    pub delivery_id: i64,
    pub order_date: NaiveDateTime,
    pub status: String,
}

/// Order header joined with its member and delivery
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderJoinRow {
    #[sqlx(flatten)]
    pub order: OrderRow,
    pub member_name: String,
    pub member_city: Option<String>,
    pub member_street: Option<String>,
    pub member_zipcode: Option<String>,
    pub delivery_city: Option<String>,
    pub delivery_street: Option<String>,
    pub delivery_zipcode: Option<String>,
    pub delivery_status: String,
}

/// One row of the full graph join: an order with at most one line and item
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderGraphRow {
    #[sqlx(flatten)]
    pub header: OrderJoinRow,
    pub order_item_id: Option<i64>,
    pub item_id: Option<i64>,
    pub order_price: Option<i32>,
    pub count: Option<i32>,
    pub dtype: Option<String>,
    pub item_name: Option<String>,
    pub price: Option<i32>,
    pub stock_quantity: Option<i32>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub artist: Option<String>,
    pub etc: Option<String>,
    pub director: Option<String>,
    pub actor: Option<String>,
}

impl OrderGraphRow {
    /// Splits out the line and item, if this row carries one
    pub fn line(&self) -> Option<(OrderItemRow, ItemRow)> {
        let order_item_id = self.order_item_id?;
        let item_id = self.item_id?;

        let line = OrderItemRow {
            order_item_id,
            order_id: self.header.order.order_id,
            item_id,
            order_price: self.order_price?,
            count: self.count?,
        };
        let item = ItemRow {
            item_id,
            dtype: self.dtype.clone()?,
            name: self.item_name.clone()?,
            price: self.price?,
            stock_quantity: self.stock_quantity?,
            author: self.author.clone(),
            isbn: self.isbn.clone(),
            artist: self.artist.clone(),
            etc: self.etc.clone(),
            director: self.director.clone(),
            actor: self.actor.clone(),
        };
        Some((line, item))
    }
}

/// Database row for a member
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MemberRow {
    pub member_id: i64,
    pub name: String,
    pub city: Option<String>,
    pub street: Option<String>,
    pub zipcode: Option<String>,
}

/// Database row for a delivery
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DeliveryRow {
    pub delivery_id: i64,
    pub city: Option<String>,
    pub street: Option<String>,
    pub zipcode: Option<String>,
    pub status: String,
}

/// Database row for an item, every kind's columns included
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ItemRow {
    pub item_id: i64,
    pub dtype: String,
    pub name: String,
    pub price: i32,
    pub stock_quantity: i32,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub artist: Option<String>,
    pub etc: Option<String>,
    pub director: Option<String>,
    pub actor: Option<String>,
}

/// Database row for an order line
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderItemRow {
    pub order_item_id: i64,
    pub order_id: i64,
    pub item_id: i64,
    pub order_price: i32,
    pub count: i32,
}
