//! Order Domain Ports
//!
//! This module defines the port interfaces for the order domain. Every method
//! is one round-trip to the backing store: one SQL statement for reads, one
//! transaction for writes. The fetch strategies in
//! [`crate::services::OrderQueryService`] are built from these calls, and the
//! [`crate::session::Session`] counts them.
//!
//! # Architecture
//!
//! - `OrderPort`: entity access. Returns `Order`, `Member`, `Delivery`,
//!   `OrderItem` and `Item` with only the associations the call fetches.
//! - `OrderQueryPort`: DTO projections that select exactly the columns a
//!   response needs and never build entities.
//!
//! Two adapters implement both traits:
//!
//! - **Postgres Adapter**: `infra_db::adapters::PostgresOrderAdapter`
//! - **In-Memory Store**: [`crate::adapters::InMemoryOrderStore`]
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_order::ports::{OrderPort, OrderSearch};
//! use std::sync::Arc;
//!
//! let port: Arc<dyn OrderPort> = Arc::new(InMemoryOrderStore::new());
//! let orders = port.find_orders(&OrderSearch::default()).await?;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use core_kernel::{
    DeliveryId, DomainPort, HealthCheckable, ItemId, MemberId, OrderId, PortError,
};

use crate::delivery::Delivery;
use crate::dto::{OrderFlatDto, OrderItemQueryDto, OrderQueryDto, OrderSimpleQueryDto};
use crate::error::OrderError;
use crate::item::{Item, ItemDraft};
use crate::member::{Member, MemberDraft};
use crate::order::{Order, OrderItem, OrderStatus};

/// Upper bound on rows returned by a search
pub const MAX_SEARCH_RESULTS: u32 = 1000;

/// Search criteria for orders
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSearch {
    /// Substring of the member name
    pub member_name: Option<String>,
    /// Exact order status
    pub order_status: Option<OrderStatus>,
}

impl OrderSearch {
    /// Creates a search by member name
    pub fn by_member_name(name: impl Into<String>) -> Self {
        Self {
            member_name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Creates a search by order status
    pub fn by_status(status: OrderStatus) -> Self {
        Self {
            order_status: Some(status),
            ..Default::default()
        }
    }

    /// Returns the member name filter, ignoring blank input
    pub fn member_name_filter(&self) -> Option<&str> {
        self.member_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    /// Checks an order against the criteria
    pub fn matches(&self, status: OrderStatus, member_name: &str) -> bool {
        let status_ok = self.order_status.map_or(true, |wanted| wanted == status);
        let name_ok = self
            .member_name_filter()
            .map_or(true, |wanted| member_name.contains(wanted));
        status_ok && name_ok
    }
}

/// Offset/limit window over orders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub offset: u32,
    pub limit: u32,
}

impl Page {
    pub const DEFAULT_LIMIT: u32 = 100;

    pub fn new(offset: u32, limit: u32) -> Self {
        Self { offset, limit }
    }

    /// Applies the window to an already ordered iterator
    pub fn apply<T>(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.offset as usize)
            .take(self.limit as usize)
            .collect()
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

/// One requested order line: which item and how many
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineRequest {
    pub item_id: ItemId,
    pub count: i32,
}

/// Entity access for the order aggregate
///
/// Reads return entities with exactly the associations the method name says
/// are fetched; everything else is `Lazy::Unloaded`.
#[async_trait]
pub trait OrderPort: DomainPort + HealthCheckable {
    // ========================================================================
    // Root queries
    // ========================================================================

    /// Orders matching the search, no associations loaded, ordered by id,
    /// at most [`MAX_SEARCH_RESULTS`]
    async fn find_orders(&self, search: &OrderSearch) -> Result<Vec<Order>, PortError>;

    /// Orders with member and delivery fetch-joined, optionally paged
    async fn find_orders_with_member_delivery(
        &self,
        page: Option<Page>,
    ) -> Result<Vec<Order>, PortError>;

    /// Orders with member, delivery, order items and items fetch-joined,
    /// one `Order` per id
    async fn find_orders_with_items(&self) -> Result<Vec<Order>, PortError>;

    /// A single fully loaded order
    async fn find_order_graph(&self, id: OrderId) -> Result<Order, PortError>;

    // ========================================================================
    // Association loads
    // ========================================================================

    async fn find_member(&self, id: MemberId) -> Result<Member, PortError>;

    async fn find_delivery(&self, id: DeliveryId) -> Result<Delivery, PortError>;

    async fn find_item(&self, id: ItemId) -> Result<Item, PortError>;

    /// Lines of one order, `item` unloaded
    async fn find_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, PortError>;

    /// Lines of several orders in one `IN (...)` query, `item` unloaded
    async fn find_order_items_in(
        &self,
        order_ids: &[OrderId],
    ) -> Result<Vec<OrderItem>, PortError>;

    /// Several items in one `IN (...)` query
    async fn find_items_in(&self, item_ids: &[ItemId]) -> Result<Vec<Item>, PortError>;

    // ========================================================================
    // Writes
    // ========================================================================

    async fn join_member(&self, draft: MemberDraft) -> Result<MemberId, PortError>;

    async fn register_item(&self, draft: ItemDraft) -> Result<ItemId, PortError>;

    /// Places an order for a member
    ///
    /// Lines are priced at the items' current prices and their stock is
    /// taken. Everything is persisted atomically.
    async fn place_order(
        &self,
        member_id: MemberId,
        lines: &[LineRequest],
    ) -> Result<OrderId, OrderError>;

    /// Cancels an order and restocks its lines atomically
    async fn cancel_order(&self, order_id: OrderId) -> Result<(), OrderError>;
}

/// DTO projections over the order tables
#[async_trait]
pub trait OrderQueryPort: DomainPort {
    /// Order summaries from one join of orders, members and deliveries
    async fn find_order_simple_query_dtos(&self) -> Result<Vec<OrderSimpleQueryDto>, PortError>;

    /// Order roots with empty `order_items`
    async fn find_order_query_dtos(&self) -> Result<Vec<OrderQueryDto>, PortError>;

    /// Lines of one order
    async fn find_order_item_query_dtos(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<OrderItemQueryDto>, PortError>;

    /// Lines of several orders in one query
    async fn find_order_item_query_dtos_in(
        &self,
        order_ids: &[OrderId],
    ) -> Result<Vec<OrderItemQueryDto>, PortError>;

    /// One row per order line from a single join of all order tables,
    /// ordered by order id then line id
    async fn find_order_flat_dtos(&self) -> Result<Vec<OrderFlatDto>, PortError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_matches_everything_by_default() {
        let search = OrderSearch::default();
        assert!(search.matches(OrderStatus::Cancel, "anyone"));
    }

    #[test]
    fn test_search_by_name_is_substring() {
        let search = OrderSearch::by_member_name("user");
        assert!(search.matches(OrderStatus::Order, "userA"));
        assert!(!search.matches(OrderStatus::Order, "memberB"));
    }

    #[test]
    fn test_search_blank_name_ignored() {
        let search = OrderSearch::by_member_name("  ");
        assert_eq!(search.member_name_filter(), None);
        assert!(search.matches(OrderStatus::Order, "anyone"));
    }

    #[test]
    fn test_search_by_status() {
        let search = OrderSearch::by_status(OrderStatus::Cancel);
        assert!(!search.matches(OrderStatus::Order, "userA"));
    }

    #[test]
    fn test_page_apply() {
        let page = Page::new(1, 2);
        assert_eq!(page.apply(1..=5), vec![2, 3]);
    }

    #[test]
    fn test_page_default() {
        assert_eq!(Page::default(), Page::new(0, 100));
    }
}
