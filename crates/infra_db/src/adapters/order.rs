//! PostgreSQL Order Adapter
//!
//! Implements both order ports on top of [`OrderRepository`] and
//! [`OrderQueryRepository`]. Every port call maps to exactly one repository
//! call, which keeps the round-trip counts of the fetch strategies honest.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresOrderAdapter;
//! use domain_order::{OrderPort, OrderQueryPort};
//! use std::sync::Arc;
//!
//! let adapter = Arc::new(PostgresOrderAdapter::new(pool));
//! let orders: Arc<dyn OrderPort> = adapter.clone();
//! let queries: Arc<dyn OrderQueryPort> = adapter;
//! ```

use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{Local, Utc};
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{
    raw_keys, AdapterHealth, DeliveryId, DomainPort, HealthCheckResult, HealthCheckable, ItemId,
    MemberId, OrderId, OrderItemId, PortError,
};
use domain_order::{
    Address, Delivery, DeliveryStatus, Item, ItemDraft, ItemKind, LineRequest, Member,
    MemberDraft, Order, OrderError, OrderDraft, OrderFlatDto, OrderItem, OrderItemQueryDto,
    OrderLine, OrderPort, OrderQueryDto, OrderQueryPort, OrderSearch, OrderSimpleQueryDto,
    OrderStatus, Page,
};

use crate::repositories::order::{
    DeliveryRow, ItemRow, MemberRow, OrderGraphRow, OrderItemRow, OrderJoinRow, OrderRepository,
    OrderRow,
};
use crate::repositories::order_query::{
    OrderFlatRow, OrderLineRow, OrderQueryRepository, OrderSummaryRow,
};

const ADAPTER_ID: &str = "postgres-order-adapter";

/// PostgreSQL-backed implementation of `OrderPort` and `OrderQueryPort`
///
/// # Error Handling
///
/// Database errors become `PortError`s through `From<DatabaseError>`:
/// missing rows are `NotFound`, constraint and guarded-update failures are
/// `Conflict`, connection trouble is `Connection`/`Timeout`.
#[derive(Debug, Clone)]
pub struct PostgresOrderAdapter {
    orders: OrderRepository,
    queries: OrderQueryRepository,
    pool: PgPool,
}

impl PostgresOrderAdapter {
    /// Creates a new adapter over the given pool
    pub fn new(pool: PgPool) -> Self {
        Self {
            orders: OrderRepository::new(pool.clone()),
            queries: OrderQueryRepository::new(pool.clone()),
            pool,
        }
    }

    /// Returns the entity repository, for operations the ports don't expose
    pub fn repository(&self) -> &OrderRepository {
        &self.orders
    }
}

impl DomainPort for PostgresOrderAdapter {}

#[async_trait]
impl HealthCheckable for PostgresOrderAdapter {
    /// Checks database connectivity with `SELECT 1`
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();

        let result = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await;

        let latency_ms = start.elapsed().as_millis() as u64;

        let (status, message) = match result {
            Ok(_) => (AdapterHealth::Healthy, None),
            Err(e) => (AdapterHealth::Unhealthy, Some(format!("Database error: {}", e))),
        };

        HealthCheckResult {
            adapter_id: ADAPTER_ID.to_string(),
            status,
            latency_ms,
            message,
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl OrderPort for PostgresOrderAdapter {
    #[instrument(skip(self))]
    async fn find_orders(&self, search: &OrderSearch) -> Result<Vec<Order>, PortError> {
        let rows = self.orders.search(search).await?;
        debug!(count = rows.len(), "Orders found");
        rows.into_iter().map(row_to_order).collect()
    }

    #[instrument(skip(self))]
    async fn find_orders_with_member_delivery(
        &self,
        page: Option<Page>,
    ) -> Result<Vec<Order>, PortError> {
        let window = page.map(|page| (i64::from(page.offset), i64::from(page.limit)));
        let rows = self.orders.find_with_member_delivery(window).await?;
        rows.into_iter().map(join_row_to_order).collect()
    }

    #[instrument(skip(self))]
    async fn find_orders_with_items(&self) -> Result<Vec<Order>, PortError> {
        let rows = self.orders.find_graphs().await?;
        debug!(rows = rows.len(), "Order graph rows fetched");
        graph_rows_to_orders(rows)
    }

    #[instrument(skip(self), fields(order_id = %id))]
    async fn find_order_graph(&self, id: OrderId) -> Result<Order, PortError> {
        let rows = self.orders.find_graph(id.value()).await?;
        graph_rows_to_orders(rows)?
            .into_iter()
            .next()
            .ok_or_else(|| PortError::not_found("Order", id))
    }

    #[instrument(skip(self), fields(member_id = %id))]
    async fn find_member(&self, id: MemberId) -> Result<Member, PortError> {
        Ok(row_to_member(self.orders.find_member(id.value()).await?))
    }

    #[instrument(skip(self), fields(delivery_id = %id))]
    async fn find_delivery(&self, id: DeliveryId) -> Result<Delivery, PortError> {
        row_to_delivery(self.orders.find_delivery(id.value()).await?)
    }

    #[instrument(skip(self), fields(item_id = %id))]
    async fn find_item(&self, id: ItemId) -> Result<Item, PortError> {
        row_to_item(self.orders.find_item(id.value()).await?)
    }

    #[instrument(skip(self), fields(order_id = %order_id))]
    async fn find_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, PortError> {
        let rows = self.orders.find_order_items(order_id.value()).await?;
        Ok(rows.into_iter().map(row_to_order_item).collect())
    }

    #[instrument(skip(self, order_ids), fields(count = order_ids.len()))]
    async fn find_order_items_in(
        &self,
        order_ids: &[OrderId],
    ) -> Result<Vec<OrderItem>, PortError> {
        let keys = raw_keys(order_ids.iter().copied());
        let rows = self.orders.find_order_items_in(&keys).await?;
        Ok(rows.into_iter().map(row_to_order_item).collect())
    }

    #[instrument(skip(self, item_ids), fields(count = item_ids.len()))]
    async fn find_items_in(&self, item_ids: &[ItemId]) -> Result<Vec<Item>, PortError> {
        let keys = raw_keys(item_ids.iter().copied());
        let rows = self.orders.find_items_in(&keys).await?;
        rows.into_iter().map(row_to_item).collect()
    }

    #[instrument(skip(self, draft), fields(name = %draft.name))]
    async fn join_member(&self, draft: MemberDraft) -> Result<MemberId, PortError> {
        Ok(MemberId::new(self.orders.insert_member(&draft).await?))
    }

    #[instrument(skip(self, draft), fields(name = %draft.name))]
    async fn register_item(&self, draft: ItemDraft) -> Result<ItemId, PortError> {
        Ok(ItemId::new(self.orders.insert_item(&draft).await?))
    }

    #[instrument(skip(self, lines), fields(member_id = %member_id, lines = lines.len()))]
    async fn place_order(
        &self,
        member_id: MemberId,
        lines: &[LineRequest],
    ) -> Result<OrderId, OrderError> {
        let member = row_to_member(
            self.orders
                .find_member(member_id.value())
                .await
                .map_err(PortError::from)?,
        );

        let keys = raw_keys(lines.iter().map(|line| line.item_id));
        let mut items: HashMap<ItemId, Item> = HashMap::new();
        for row in self.orders.find_items_in(&keys).await.map_err(PortError::from)? {
            let item = row_to_item(row)?;
            items.insert(item.id, item);
        }

        let mut order_lines = Vec::with_capacity(lines.len());
        for request in lines {
            let item = items
                .get_mut(&request.item_id)
                .ok_or_else(|| PortError::not_found("Item", request.item_id))?;
            order_lines.push(OrderLine::create(item, request.count)?);
        }
        let draft = OrderDraft::create(&member, order_lines, Local::now().naive_local())?;

        let order_id = self
            .orders
            .insert_order(member_id.value(), &draft)
            .await
            .map_err(PortError::from)?;
        debug!(order_id, total = draft.total_price(), "Order stored");
        Ok(OrderId::new(order_id))
    }

    #[instrument(skip(self), fields(order_id = %order_id))]
    async fn cancel_order(&self, order_id: OrderId) -> Result<(), OrderError> {
        let mut order = self.find_order_graph(order_id).await?;
        order.cancel()?;

        let restock: Vec<(i64, i32)> = order
            .order_items
            .require("orderItems")?
            .iter()
            .map(|line| (line.item_id.value(), line.count))
            .collect();

        self.orders
            .cancel_order(order_id.value(), &restock)
            .await
            .map_err(PortError::from)?;
        Ok(())
    }
}

#[async_trait]
impl OrderQueryPort for PostgresOrderAdapter {
    #[instrument(skip(self))]
    async fn find_order_simple_query_dtos(&self) -> Result<Vec<OrderSimpleQueryDto>, PortError> {
        let rows = self.queries.find_summaries().await?;
        rows.into_iter()
            .map(|row| {
                let (order_id, name, order_date, order_status, address) = split_summary(row)?;
                Ok(OrderSimpleQueryDto {
                    order_id,
                    name,
                    order_date,
                    order_status,
                    address,
                })
            })
            .collect()
    }

    #[instrument(skip(self))]
    async fn find_order_query_dtos(&self) -> Result<Vec<OrderQueryDto>, PortError> {
        let rows = self.queries.find_summaries().await?;
        rows.into_iter()
            .map(|row| {
                let (order_id, name, order_date, order_status, address) = split_summary(row)?;
                Ok(OrderQueryDto {
                    order_id,
                    name,
                    order_date,
                    order_status,
                    address,
                    order_items: Vec::new(),
                })
            })
            .collect()
    }

    #[instrument(skip(self), fields(order_id = %order_id))]
    async fn find_order_item_query_dtos(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<OrderItemQueryDto>, PortError> {
        let rows = self.queries.find_lines(order_id.value()).await?;
        Ok(rows.into_iter().map(row_to_item_query_dto).collect())
    }

    #[instrument(skip(self, order_ids), fields(count = order_ids.len()))]
    async fn find_order_item_query_dtos_in(
        &self,
        order_ids: &[OrderId],
    ) -> Result<Vec<OrderItemQueryDto>, PortError> {
        let keys = raw_keys(order_ids.iter().copied());
        let rows = self.queries.find_lines_in(&keys).await?;
        Ok(rows.into_iter().map(row_to_item_query_dto).collect())
    }

    #[instrument(skip(self))]
    async fn find_order_flat_dtos(&self) -> Result<Vec<OrderFlatDto>, PortError> {
        let rows = self.queries.find_flat().await?;
        rows.into_iter().map(row_to_flat_dto).collect()
    }
}

// ============================================================================
// Row conversions
// ============================================================================

fn address(city: Option<String>, street: Option<String>, zipcode: Option<String>) -> Address {
    Address::new(
        city.unwrap_or_default(),
        street.unwrap_or_default(),
        zipcode.unwrap_or_default(),
    )
}

fn parse_order_status(value: &str) -> Result<OrderStatus, PortError> {
    OrderStatus::from_str(value).map_err(|e| PortError::transformation(e.to_string()))
}

fn parse_delivery_status(value: &str) -> Result<DeliveryStatus, PortError> {
    DeliveryStatus::from_str(value).map_err(|e| PortError::transformation(e.to_string()))
}

fn row_to_order(row: OrderRow) -> Result<Order, PortError> {
    Ok(Order::unloaded(
        OrderId::new(row.order_id),
        MemberId::new(row.member_id),
        DeliveryId::new(row.delivery_id),
        row.order_date,
        parse_order_status(&row.status)?,
    ))
}

fn join_row_to_order(row: OrderJoinRow) -> Result<Order, PortError> {
    let mut order = row_to_order(row.order)?;
    order.member.set(Member {
        id: order.member_id,
        name: row.member_name,
        address: address(row.member_city, row.member_street, row.member_zipcode),
    });
    order.delivery.set(Delivery {
        id: order.delivery_id,
        address: address(row.delivery_city, row.delivery_street, row.delivery_zipcode),
        status: parse_delivery_status(&row.delivery_status)?,
    });
    Ok(order)
}

/// Folds graph rows (one per line) back into orders, in row order
fn graph_rows_to_orders(rows: Vec<OrderGraphRow>) -> Result<Vec<Order>, PortError> {
    let mut orders: Vec<Order> = Vec::new();

    for row in rows {
        let line = row.line();
        let is_new = orders
            .last()
            .map_or(true, |order| order.id.value() != row.header.order.order_id);
        if is_new {
            let mut order = join_row_to_order(row.header)?;
            order.order_items.set(Vec::new());
            orders.push(order);
        }

        if let (Some((line_row, item_row)), Some(order)) = (line, orders.last_mut()) {
            let mut order_item = row_to_order_item(line_row);
            order_item.item.set(row_to_item(item_row)?);
            if let Some(order_items) = order.order_items.get_mut() {
                order_items.push(order_item);
            }
        }
    }
    Ok(orders)
}

fn row_to_member(row: MemberRow) -> Member {
    Member {
        id: MemberId::new(row.member_id),
        name: row.name,
        address: address(row.city, row.street, row.zipcode),
    }
}

fn row_to_delivery(row: DeliveryRow) -> Result<Delivery, PortError> {
    Ok(Delivery {
        id: DeliveryId::new(row.delivery_id),
        address: address(row.city, row.street, row.zipcode),
        status: parse_delivery_status(&row.status)?,
    })
}

fn row_to_item(row: ItemRow) -> Result<Item, PortError> {
    let kind = match row.dtype.as_str() {
        "B" => ItemKind::Book {
            author: row.author,
            isbn: row.isbn,
        },
        "A" => ItemKind::Album {
            artist: row.artist,
            etc: row.etc,
        },
        "M" => ItemKind::Movie {
            director: row.director,
            actor: row.actor,
        },
        other => {
            return Err(PortError::transformation(format!(
                "unknown item dtype '{}' for item {}",
                other, row.item_id
            )))
        }
    };

    Ok(Item {
        id: ItemId::new(row.item_id),
        name: row.name,
        price: row.price,
        stock_quantity: row.stock_quantity,
        kind,
    })
}

fn row_to_order_item(row: OrderItemRow) -> OrderItem {
    OrderItem::unloaded(
        OrderItemId::new(row.order_item_id),
        OrderId::new(row.order_id),
        ItemId::new(row.item_id),
        row.order_price,
        row.count,
    )
}

type Summary = (OrderId, String, chrono::NaiveDateTime, OrderStatus, Address);

fn split_summary(row: OrderSummaryRow) -> Result<Summary, PortError> {
    Ok((
        OrderId::new(row.order_id),
        row.name,
        row.order_date,
        parse_order_status(&row.order_status)?,
        address(row.city, row.street, row.zipcode),
    ))
}

fn row_to_item_query_dto(row: OrderLineRow) -> OrderItemQueryDto {
    OrderItemQueryDto {
        order_id: OrderId::new(row.order_id),
        item_name: row.item_name,
        order_price: row.order_price,
        count: row.count,
    }
}

fn row_to_flat_dto(row: OrderFlatRow) -> Result<OrderFlatDto, PortError> {
    let (order_id, name, order_date, order_status, address) = split_summary(row.summary)?;
    Ok(OrderFlatDto {
        order_id,
        name,
        order_date,
        order_status,
        address,
        item_name: row.item_name,
        order_price: row.order_price,
        count: row.count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn order_date() -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn header(order_id: i64) -> OrderJoinRow {
        OrderJoinRow {
            order: OrderRow {
                order_id,
                member_id: 1,
                delivery_id: 100 + order_id,
                order_date: order_date(),
                status: "ORDER".to_string(),
            },
            member_name: "userA".to_string(),
            member_city: Some("Seoul".to_string()),
            member_street: Some("1".to_string()),
            member_zipcode: Some("1111".to_string()),
            delivery_city: Some("Seoul".to_string()),
            delivery_street: Some("1".to_string()),
            delivery_zipcode: Some("1111".to_string()),
            delivery_status: "READY".to_string(),
        }
    }

    fn graph_row(order_id: i64, line: Option<(i64, &str)>) -> OrderGraphRow {
        OrderGraphRow {
            header: header(order_id),
            order_item_id: line.map(|(id, _)| id),
            item_id: line.map(|(id, _)| id + 1000),
            order_price: line.map(|_| 10000),
            count: line.map(|_| 2),
            dtype: line.map(|_| "B".to_string()),
            item_name: line.map(|(_, name)| name.to_string()),
            price: line.map(|_| 10000),
            stock_quantity: line.map(|_| 50),
            author: None,
            isbn: None,
            artist: None,
            etc: None,
            director: None,
            actor: None,
        }
    }

    #[test]
    fn test_graph_rows_fold_into_orders() {
        let rows = vec![
            graph_row(1, Some((10, "JPA1 BOOK"))),
            graph_row(1, Some((11, "JPA2 BOOK"))),
            graph_row(2, None),
        ];

        let orders = graph_rows_to_orders(rows).unwrap();

        assert_eq!(orders.len(), 2);
        let first = orders[0].order_items.get().unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[1].item.get().unwrap().name, "JPA2 BOOK");
        assert!(orders[1].order_items.get().unwrap().is_empty());
        assert_eq!(orders[1].member.get().unwrap().name, "userA");
    }

    #[test]
    fn test_unknown_dtype_rejected() {
        let row = ItemRow {
            item_id: 7,
            dtype: "X".to_string(),
            name: "mystery".to_string(),
            price: 1,
            stock_quantity: 1,
            author: None,
            isbn: None,
            artist: None,
            etc: None,
            director: None,
            actor: None,
        };
        assert!(matches!(
            row_to_item(row),
            Err(PortError::Transformation { .. })
        ));
    }

    #[test]
    fn test_unknown_status_rejected() {
        let mut row = header(1);
        row.order.status = "SHIPPED".to_string();
        assert!(join_row_to_order(row).is_err());
    }

    #[test]
    fn test_missing_address_parts_default_to_empty() {
        let member = row_to_member(MemberRow {
            member_id: 3,
            name: "userC".to_string(),
            city: Some("Busan".to_string()),
            street: None,
            zipcode: None,
        });
        assert_eq!(member.address.city, "Busan");
        assert_eq!(member.address.street, "");
    }
}
