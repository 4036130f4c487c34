//! Per-request fetch session
//!
//! A `Session` sits between a fetch strategy and the ports. It does three
//! things:
//!
//! - counts every port call as one store round-trip;
//! - keeps an identity map of the members, deliveries and items it has seen,
//!   so asking for the same entity twice in one request costs one round-trip;
//! - initializes lazy associations, either one owner at a time or in batches
//!   of `IN (...)` queries.
//!
//! Sessions are cheap and short-lived: create one per request and drop it
//! with [`Session::finish`].

use std::collections::{HashMap, HashSet};
use std::future::Future;

use tracing::debug;

use core_kernel::{DeliveryId, ItemId, MemberId, OrderId, PortError};

use crate::delivery::Delivery;
use crate::dto::{OrderFlatDto, OrderItemQueryDto, OrderQueryDto, OrderSimpleQueryDto};
use crate::item::Item;
use crate::member::Member;
use crate::order::{Order, OrderItem};
use crate::ports::{OrderPort, OrderQueryPort, OrderSearch, Page};

/// A value together with the number of store round-trips it took
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    pub value: T,
    pub round_trips: u32,
}

impl<T> Fetched<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetched<U> {
        Fetched {
            value: f(self.value),
            round_trips: self.round_trips,
        }
    }
}

/// Round-trip counting, identity-mapped access to the order ports
pub struct Session<'a> {
    orders: &'a dyn OrderPort,
    queries: &'a dyn OrderQueryPort,
    round_trips: u32,
    members: HashMap<MemberId, Member>,
    deliveries: HashMap<DeliveryId, Delivery>,
    items: HashMap<ItemId, Item>,
}

impl<'a> Session<'a> {
    pub fn new(orders: &'a dyn OrderPort, queries: &'a dyn OrderQueryPort) -> Self {
        Self {
            orders,
            queries,
            round_trips: 0,
            members: HashMap::new(),
            deliveries: HashMap::new(),
            items: HashMap::new(),
        }
    }

    /// Store round-trips issued so far
    pub fn round_trips(&self) -> u32 {
        self.round_trips
    }

    /// Ends the session, pairing the result with the round-trip count
    pub fn finish<T>(self, value: T) -> Fetched<T> {
        Fetched {
            value,
            round_trips: self.round_trips,
        }
    }

    async fn trip<T, F>(&mut self, operation: &'static str, call: F) -> Result<T, PortError>
    where
        F: Future<Output = Result<T, PortError>>,
    {
        self.round_trips += 1;
        debug!(operation, round_trip = self.round_trips, "store round-trip");
        call.await
    }

    /// Puts every loaded association of an order into the identity map
    fn remember(&mut self, order: &Order) {
        if let Some(member) = order.member.get() {
            self.members.entry(member.id).or_insert_with(|| member.clone());
        }
        if let Some(delivery) = order.delivery.get() {
            self.deliveries.entry(delivery.id).or_insert_with(|| delivery.clone());
        }
        if let Some(order_items) = order.order_items.get() {
            for item in order_items.iter().filter_map(|line| line.item.get()) {
                self.items.entry(item.id).or_insert_with(|| item.clone());
            }
        }
    }

    // ========================================================================
    // Root queries
    // ========================================================================

    pub async fn find_orders(&mut self, search: &OrderSearch) -> Result<Vec<Order>, PortError> {
        let port = self.orders;
        self.trip("find_orders", port.find_orders(search)).await
    }

    pub async fn find_orders_with_member_delivery(
        &mut self,
        page: Option<Page>,
    ) -> Result<Vec<Order>, PortError> {
        let port = self.orders;
        let orders = self
            .trip(
                "find_orders_with_member_delivery",
                port.find_orders_with_member_delivery(page),
            )
            .await?;
        orders.iter().for_each(|order| self.remember(order));
        Ok(orders)
    }

    pub async fn find_orders_with_items(&mut self) -> Result<Vec<Order>, PortError> {
        let port = self.orders;
        let orders = self
            .trip("find_orders_with_items", port.find_orders_with_items())
            .await?;
        orders.iter().for_each(|order| self.remember(order));
        Ok(orders)
    }

    // ========================================================================
    // Lazy initialization, one owner at a time
    // ========================================================================

    /// Loads `order.member` unless it is loaded or already in the session
    pub async fn initialize_member(&mut self, order: &mut Order) -> Result<(), PortError> {
        if order.member.is_loaded() {
            return Ok(());
        }
        let member = match self.members.get(&order.member_id) {
            Some(member) => member.clone(),
            None => {
                let port = self.orders;
                let member = self.trip("find_member", port.find_member(order.member_id)).await?;
                self.members.insert(member.id, member.clone());
                member
            }
        };
        order.member.set(member);
        Ok(())
    }

    /// Loads `order.delivery` unless it is loaded or already in the session
    pub async fn initialize_delivery(&mut self, order: &mut Order) -> Result<(), PortError> {
        if order.delivery.is_loaded() {
            return Ok(());
        }
        let delivery = match self.deliveries.get(&order.delivery_id) {
            Some(delivery) => delivery.clone(),
            None => {
                let port = self.orders;
                let delivery = self
                    .trip("find_delivery", port.find_delivery(order.delivery_id))
                    .await?;
                self.deliveries.insert(delivery.id, delivery.clone());
                delivery
            }
        };
        order.delivery.set(delivery);
        Ok(())
    }

    /// Loads the order's lines with one query; their items stay unloaded
    pub async fn initialize_order_items(&mut self, order: &mut Order) -> Result<(), PortError> {
        if order.order_items.is_loaded() {
            return Ok(());
        }
        let port = self.orders;
        let order_items = self
            .trip("find_order_items", port.find_order_items(order.id))
            .await?;
        order.order_items.set(order_items);
        Ok(())
    }

    /// Loads `order_item.item` unless it is loaded or already in the session
    pub async fn initialize_item(&mut self, order_item: &mut OrderItem) -> Result<(), PortError> {
        if order_item.item.is_loaded() {
            return Ok(());
        }
        let item = match self.items.get(&order_item.item_id) {
            Some(item) => item.clone(),
            None => {
                let port = self.orders;
                let item = self.trip("find_item", port.find_item(order_item.item_id)).await?;
                self.items.insert(item.id, item.clone());
                item
            }
        };
        order_item.item.set(item);
        Ok(())
    }

    /// Walks the whole order graph, loading each association as it is reached
    pub async fn initialize_graph(&mut self, order: &mut Order) -> Result<(), PortError> {
        self.initialize_member(order).await?;
        self.initialize_delivery(order).await?;
        self.initialize_order_items(order).await?;
        if let Some(order_items) = order.order_items.get_mut() {
            for order_item in order_items.iter_mut() {
                self.initialize_item(order_item).await?;
            }
        }
        Ok(())
    }

    // ========================================================================
    // Batch initialization
    // ========================================================================

    /// Loads order lines and their items for many orders at once
    ///
    /// Lines are loaded for up to `batch_size` orders per `IN (...)` query.
    /// Then every referenced item that is not in the session yet is loaded,
    /// again `batch_size` ids per query.
    pub async fn batch_initialize_order_items(
        &mut self,
        orders: &mut [Order],
        batch_size: usize,
    ) -> Result<(), PortError> {
        let batch_size = batch_size.max(1);
        let pending: Vec<OrderId> = orders
            .iter()
            .filter(|order| !order.order_items.is_loaded())
            .map(|order| order.id)
            .collect();

        let mut lines_by_order: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
        for chunk in pending.chunks(batch_size) {
            let port = self.orders;
            let lines = self
                .trip("find_order_items_in", port.find_order_items_in(chunk))
                .await?;
            for line in lines {
                lines_by_order.entry(line.order_id).or_default().push(line);
            }
        }
        for order in orders.iter_mut().filter(|order| !order.order_items.is_loaded()) {
            order
                .order_items
                .set(lines_by_order.remove(&order.id).unwrap_or_default());
        }

        let mut seen = HashSet::new();
        let missing: Vec<ItemId> = orders
            .iter()
            .filter_map(|order| order.order_items.get())
            .flatten()
            .filter(|line| !line.item.is_loaded())
            .map(|line| line.item_id)
            .filter(|id| !self.items.contains_key(id) && seen.insert(*id))
            .collect();

        for chunk in missing.chunks(batch_size) {
            let port = self.orders;
            let items = self.trip("find_items_in", port.find_items_in(chunk)).await?;
            for item in items {
                self.items.insert(item.id, item);
            }
        }

        for order in orders.iter_mut() {
            let Some(order_items) = order.order_items.get_mut() else {
                continue;
            };
            for line in order_items.iter_mut().filter(|line| !line.item.is_loaded()) {
                let item = self
                    .items
                    .get(&line.item_id)
                    .cloned()
                    .ok_or_else(|| PortError::not_found("Item", line.item_id))?;
                line.item.set(item);
            }
        }
        Ok(())
    }

    // ========================================================================
    // DTO projections
    // ========================================================================

    pub async fn find_order_simple_query_dtos(
        &mut self,
    ) -> Result<Vec<OrderSimpleQueryDto>, PortError> {
        let port = self.queries;
        self.trip("find_order_simple_query_dtos", port.find_order_simple_query_dtos())
            .await
    }

    pub async fn find_order_query_dtos(&mut self) -> Result<Vec<OrderQueryDto>, PortError> {
        let port = self.queries;
        self.trip("find_order_query_dtos", port.find_order_query_dtos())
            .await
    }

    pub async fn find_order_item_query_dtos(
        &mut self,
        order_id: OrderId,
    ) -> Result<Vec<OrderItemQueryDto>, PortError> {
        let port = self.queries;
        self.trip(
            "find_order_item_query_dtos",
            port.find_order_item_query_dtos(order_id),
        )
        .await
    }

    pub async fn find_order_item_query_dtos_in(
        &mut self,
        order_ids: &[OrderId],
    ) -> Result<Vec<OrderItemQueryDto>, PortError> {
        let port = self.queries;
        self.trip(
            "find_order_item_query_dtos_in",
            port.find_order_item_query_dtos_in(order_ids),
        )
        .await
    }

    pub async fn find_order_flat_dtos(&mut self) -> Result<Vec<OrderFlatDto>, PortError> {
        let port = self.queries;
        self.trip("find_order_flat_dtos", port.find_order_flat_dtos())
            .await
    }
}
