//! In-memory order store
//!
//! Implements both order ports over `BTreeMap` tables behind a tokio
//! `RwLock`. Each port call touches the tables exactly once, so round-trip
//! counts measured against this store match the PostgreSQL adapter. Used by
//! the tests and by the server's `memory` storage mode.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{Local, Utc};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use core_kernel::{
    AdapterHealth, DeliveryId, DomainPort, HealthCheckResult, HealthCheckable, ItemId, MemberId,
    OrderId, OrderItemId, PortError,
};

use crate::delivery::{Delivery, DeliveryStatus};
use crate::dto::{OrderFlatDto, OrderItemQueryDto, OrderQueryDto, OrderSimpleQueryDto};
use crate::error::{OrderError, OrderResult};
use crate::item::{Item, ItemDraft};
use crate::member::{Member, MemberDraft};
use crate::order::{Order, OrderDraft, OrderItem, OrderLine};
use crate::ports::{
    LineRequest, OrderPort, OrderQueryPort, OrderSearch, Page, MAX_SEARCH_RESULTS,
};
use crate::sample::seed_sample_data;

#[derive(Debug, Default)]
struct Tables {
    sequence: i64,
    members: BTreeMap<MemberId, Member>,
    items: BTreeMap<ItemId, Item>,
    deliveries: BTreeMap<DeliveryId, Delivery>,
    /// Order headers, associations unloaded
    orders: BTreeMap<OrderId, Order>,
    /// Order lines, items unloaded
    order_items: BTreeMap<OrderItemId, OrderItem>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.sequence += 1;
        self.sequence
    }

    fn member(&self, id: MemberId) -> Result<&Member, PortError> {
        self.members
            .get(&id)
            .ok_or_else(|| PortError::not_found("Member", id))
    }

    fn delivery(&self, id: DeliveryId) -> Result<&Delivery, PortError> {
        self.deliveries
            .get(&id)
            .ok_or_else(|| PortError::not_found("Delivery", id))
    }

    fn item(&self, id: ItemId) -> Result<&Item, PortError> {
        self.items
            .get(&id)
            .ok_or_else(|| PortError::not_found("Item", id))
    }

    fn header(&self, id: OrderId) -> Result<&Order, PortError> {
        self.orders
            .get(&id)
            .ok_or_else(|| PortError::not_found("Order", id))
    }

    fn lines_of(&self, order_id: OrderId) -> Vec<OrderItem> {
        self.order_items
            .values()
            .filter(|line| line.order_id == order_id)
            .cloned()
            .collect()
    }

    fn with_member_delivery(&self, header: &Order) -> Result<Order, PortError> {
        let mut order = header.clone();
        order.member.set(self.member(order.member_id)?.clone());
        order.delivery.set(self.delivery(order.delivery_id)?.clone());
        Ok(order)
    }

    fn graph(&self, header: &Order) -> Result<Order, PortError> {
        let mut order = self.with_member_delivery(header)?;
        let mut lines = self.lines_of(order.id);
        for line in lines.iter_mut() {
            line.item.set(self.item(line.item_id)?.clone());
        }
        order.order_items.set(lines);
        Ok(order)
    }

    fn simple_projection(&self, header: &Order) -> Result<OrderSimpleQueryDto, PortError> {
        Ok(OrderSimpleQueryDto {
            order_id: header.id,
            name: self.member(header.member_id)?.name.clone(),
            order_date: header.order_date,
            order_status: header.status,
            address: self.delivery(header.delivery_id)?.address.clone(),
        })
    }

    fn item_projection(&self, line: &OrderItem) -> Result<OrderItemQueryDto, PortError> {
        Ok(OrderItemQueryDto {
            order_id: line.order_id,
            item_name: self.item(line.item_id)?.name.clone(),
            order_price: line.order_price,
            count: line.count,
        })
    }
}

/// Order store held entirely in memory
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    tables: RwLock<Tables>,
}

impl InMemoryOrderStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding the sample shop data
    pub async fn seeded() -> OrderResult<Self> {
        let store = Self::new();
        seed_sample_data(&store).await?;
        Ok(store)
    }

    /// Marks an order's delivery as completed
    pub async fn complete_delivery(&self, order_id: OrderId) -> Result<(), PortError> {
        let mut tables = self.tables.write().await;
        let delivery_id = tables.header(order_id)?.delivery_id;
        let delivery = tables
            .deliveries
            .get_mut(&delivery_id)
            .ok_or_else(|| PortError::not_found("Delivery", delivery_id))?;
        delivery.status = DeliveryStatus::Comp;
        Ok(())
    }

    /// Current stock of an item
    pub async fn stock_of(&self, item_id: ItemId) -> Result<i32, PortError> {
        Ok(self.tables.read().await.item(item_id)?.stock_quantity)
    }
}

impl DomainPort for InMemoryOrderStore {}

#[async_trait]
impl HealthCheckable for InMemoryOrderStore {
    async fn health_check(&self) -> HealthCheckResult {
        HealthCheckResult {
            adapter_id: "in-memory-order-store".to_string(),
            status: AdapterHealth::Healthy,
            latency_ms: 0,
            message: Some("In-memory store always healthy".to_string()),
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl OrderPort for InMemoryOrderStore {
    async fn find_orders(&self, search: &OrderSearch) -> Result<Vec<Order>, PortError> {
        let tables = self.tables.read().await;
        let mut orders = Vec::new();
        for header in tables.orders.values() {
            let member_name = &tables.member(header.member_id)?.name;
            if search.matches(header.status, member_name) {
                orders.push(header.clone());
            }
        }
        orders.truncate(MAX_SEARCH_RESULTS as usize);
        Ok(orders)
    }

    async fn find_orders_with_member_delivery(
        &self,
        page: Option<Page>,
    ) -> Result<Vec<Order>, PortError> {
        let tables = self.tables.read().await;
        let headers: Vec<&Order> = match page {
            Some(page) => page.apply(tables.orders.values()),
            None => tables.orders.values().collect(),
        };
        headers
            .into_iter()
            .map(|header| tables.with_member_delivery(header))
            .collect()
    }

    async fn find_orders_with_items(&self) -> Result<Vec<Order>, PortError> {
        let tables = self.tables.read().await;
        tables.orders.values().map(|header| tables.graph(header)).collect()
    }

    async fn find_order_graph(&self, id: OrderId) -> Result<Order, PortError> {
        let tables = self.tables.read().await;
        tables.graph(tables.header(id)?)
    }

    async fn find_member(&self, id: MemberId) -> Result<Member, PortError> {
        Ok(self.tables.read().await.member(id)?.clone())
    }

    async fn find_delivery(&self, id: DeliveryId) -> Result<Delivery, PortError> {
        Ok(self.tables.read().await.delivery(id)?.clone())
    }

    async fn find_item(&self, id: ItemId) -> Result<Item, PortError> {
        Ok(self.tables.read().await.item(id)?.clone())
    }

    async fn find_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, PortError> {
        Ok(self.tables.read().await.lines_of(order_id))
    }

    async fn find_order_items_in(
        &self,
        order_ids: &[OrderId],
    ) -> Result<Vec<OrderItem>, PortError> {
        let tables = self.tables.read().await;
        Ok(tables
            .order_items
            .values()
            .filter(|line| order_ids.contains(&line.order_id))
            .cloned()
            .collect())
    }

    async fn find_items_in(&self, item_ids: &[ItemId]) -> Result<Vec<Item>, PortError> {
        let tables = self.tables.read().await;
        Ok(tables
            .items
            .values()
            .filter(|item| item_ids.contains(&item.id))
            .cloned()
            .collect())
    }

    async fn join_member(&self, draft: MemberDraft) -> Result<MemberId, PortError> {
        let mut tables = self.tables.write().await;
        let id = MemberId::new(tables.next_id());
        tables.members.insert(id, draft.into_member(id));
        Ok(id)
    }

    async fn register_item(&self, draft: ItemDraft) -> Result<ItemId, PortError> {
        let mut tables = self.tables.write().await;
        let id = ItemId::new(tables.next_id());
        tables.items.insert(id, draft.into_item(id));
        Ok(id)
    }

    #[instrument(skip(self, lines), fields(member_id = %member_id))]
    async fn place_order(
        &self,
        member_id: MemberId,
        lines: &[LineRequest],
    ) -> Result<OrderId, OrderError> {
        let mut tables = self.tables.write().await;
        let member = tables.member(member_id)?.clone();

        // Stock changes only land once every line has been priced
        let mut touched: HashMap<ItemId, Item> = HashMap::new();
        let mut order_lines = Vec::with_capacity(lines.len());
        for request in lines {
            if !touched.contains_key(&request.item_id) {
                let item = tables.item(request.item_id)?.clone();
                touched.insert(item.id, item);
            }
            let item = touched
                .get_mut(&request.item_id)
                .ok_or_else(|| PortError::not_found("Item", request.item_id))?;
            order_lines.push(OrderLine::create(item, request.count)?);
        }
        let draft = OrderDraft::create(&member, order_lines, Local::now().naive_local())?;

        let delivery_id = DeliveryId::new(tables.next_id());
        tables
            .deliveries
            .insert(delivery_id, draft.delivery.clone().into_delivery(delivery_id));

        let order_id = OrderId::new(tables.next_id());
        tables.orders.insert(
            order_id,
            Order::unloaded(order_id, member_id, delivery_id, draft.order_date, draft.status),
        );

        for line in &draft.lines {
            let line_id = OrderItemId::new(tables.next_id());
            tables.order_items.insert(
                line_id,
                OrderItem::unloaded(line_id, order_id, line.item_id, line.order_price, line.count),
            );
        }
        tables.items.extend(touched);

        debug!(%order_id, total = draft.total_price(), "Order stored");
        Ok(order_id)
    }

    #[instrument(skip(self), fields(order_id = %order_id))]
    async fn cancel_order(&self, order_id: OrderId) -> Result<(), OrderError> {
        let mut tables = self.tables.write().await;
        let mut order = tables.graph(tables.header(order_id)?)?;
        order.cancel()?;

        // Each line carries its own copy of the item, so restock by delta
        for line in order.order_items.require("orderItems")? {
            tables
                .items
                .get_mut(&line.item_id)
                .ok_or_else(|| PortError::not_found("Item", line.item_id))?
                .add_stock(line.count);
        }
        if let Some(header) = tables.orders.get_mut(&order_id) {
            header.status = order.status;
        }
        Ok(())
    }
}

#[async_trait]
impl OrderQueryPort for InMemoryOrderStore {
    async fn find_order_simple_query_dtos(&self) -> Result<Vec<OrderSimpleQueryDto>, PortError> {
        let tables = self.tables.read().await;
        tables
            .orders
            .values()
            .map(|header| tables.simple_projection(header))
            .collect()
    }

    async fn find_order_query_dtos(&self) -> Result<Vec<OrderQueryDto>, PortError> {
        let tables = self.tables.read().await;
        tables
            .orders
            .values()
            .map(|header| {
                let simple = tables.simple_projection(header)?;
                Ok(OrderQueryDto {
                    order_id: simple.order_id,
                    name: simple.name,
                    order_date: simple.order_date,
                    order_status: simple.order_status,
                    address: simple.address,
                    order_items: Vec::new(),
                })
            })
            .collect()
    }

    async fn find_order_item_query_dtos(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<OrderItemQueryDto>, PortError> {
        let tables = self.tables.read().await;
        tables
            .lines_of(order_id)
            .iter()
            .map(|line| tables.item_projection(line))
            .collect()
    }

    async fn find_order_item_query_dtos_in(
        &self,
        order_ids: &[OrderId],
    ) -> Result<Vec<OrderItemQueryDto>, PortError> {
        let tables = self.tables.read().await;
        tables
            .order_items
            .values()
            .filter(|line| order_ids.contains(&line.order_id))
            .map(|line| tables.item_projection(line))
            .collect()
    }

    async fn find_order_flat_dtos(&self) -> Result<Vec<OrderFlatDto>, PortError> {
        let tables = self.tables.read().await;
        let mut rows = Vec::new();
        for header in tables.orders.values() {
            let simple = tables.simple_projection(header)?;
            for line in tables.lines_of(header.id) {
                let item = tables.item_projection(&line)?;
                rows.push(OrderFlatDto {
                    order_id: simple.order_id,
                    name: simple.name.clone(),
                    order_date: simple.order_date,
                    order_status: simple.order_status,
                    address: simple.address.clone(),
                    item_name: item.item_name,
                    order_price: item.order_price,
                    count: item.count,
                });
            }
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;
    use crate::order::OrderStatus;

    async fn store_with_book(stock: i32) -> (InMemoryOrderStore, MemberId, ItemId) {
        let store = InMemoryOrderStore::new();
        let member_id = store
            .join_member(MemberDraft::new("userA", Address::new("Seoul", "1", "1111")))
            .await
            .unwrap();
        let item_id = store
            .register_item(ItemDraft::book("JPA1 BOOK", 10000, stock))
            .await
            .unwrap();
        (store, member_id, item_id)
    }

    #[tokio::test]
    async fn test_place_order_takes_stock() {
        let (store, member_id, item_id) = store_with_book(10).await;
        let order_id = store
            .place_order(member_id, &[LineRequest { item_id, count: 3 }])
            .await
            .unwrap();

        assert_eq!(store.stock_of(item_id).await.unwrap(), 7);
        let order = store.find_order_graph(order_id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Order);
        assert_eq!(order.delivery.get().unwrap().status, DeliveryStatus::Ready);
        assert_eq!(order.total_price().unwrap(), 30000);
    }

    #[tokio::test]
    async fn test_place_order_is_all_or_nothing() {
        let (store, member_id, item_id) = store_with_book(5).await;
        let lines = [
            LineRequest { item_id, count: 3 },
            LineRequest { item_id, count: 3 },
        ];
        let err = store.place_order(member_id, &lines).await.unwrap_err();

        assert!(matches!(err, OrderError::NotEnoughStock { available: 2, .. }));
        assert_eq!(store.stock_of(item_id).await.unwrap(), 5);
        assert!(store.find_orders(&OrderSearch::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_place_order_unknown_member() {
        let (store, _, item_id) = store_with_book(5).await;
        let err = store
            .place_order(MemberId::new(999), &[LineRequest { item_id, count: 1 }])
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::Port(ref e) if e.is_not_found()));
    }

    #[tokio::test]
    async fn test_cancel_restocks_and_updates_status() {
        let (store, member_id, item_id) = store_with_book(10).await;
        let order_id = store
            .place_order(member_id, &[LineRequest { item_id, count: 4 }])
            .await
            .unwrap();

        store.cancel_order(order_id).await.unwrap();

        assert_eq!(store.stock_of(item_id).await.unwrap(), 10);
        let cancelled = store
            .find_orders(&OrderSearch::by_status(OrderStatus::Cancel))
            .await
            .unwrap();
        assert_eq!(cancelled.len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_after_delivery_rejected() {
        let (store, member_id, item_id) = store_with_book(10).await;
        let order_id = store
            .place_order(member_id, &[LineRequest { item_id, count: 4 }])
            .await
            .unwrap();
        store.complete_delivery(order_id).await.unwrap();

        let err = store.cancel_order(order_id).await.unwrap_err();
        assert!(matches!(err, OrderError::AlreadyDelivered(_)));
        assert_eq!(store.stock_of(item_id).await.unwrap(), 6);
    }

    #[tokio::test]
    async fn test_health_check() {
        let store = InMemoryOrderStore::new();
        let health = store.health_check().await;
        assert_eq!(health.status, AdapterHealth::Healthy);
    }
}
