//! Application services
//!
//! [`OrderQueryService`] holds the fetch strategies. Each one answers the
//! same question (which orders exist, with which member, delivery and lines)
//! through a different sequence of store round-trips:
//!
//! | strategy | round-trips |
//! |---|---|
//! | entities / lazy DTOs | 1 + members + deliveries (+ lines per order + items) |
//! | to-one fetch join | 1 |
//! | full fetch join | 1, cannot page |
//! | to-one fetch join + batched collections | 1 + ⌈orders / batch⌉ + ⌈items / batch⌉ |
//! | DTO projection, lines per order | 1 + orders |
//! | DTO projection, lines by `IN` | 2 |
//! | flat projection regrouped in memory | 1, cannot page by order |
//!
//! [`OrderService`] places and cancels orders.

use std::sync::Arc;

use tracing::{info, instrument};

use core_kernel::{MemberId, OrderId};

use crate::dto::{
    group_flat_rows, group_items_by_order, OrderDto, OrderQueryDto, OrderSimpleDto,
    OrderSimpleQueryDto,
};
use crate::error::{OrderError, OrderResult};
use crate::order::Order;
use crate::ports::{LineRequest, OrderPort, OrderQueryPort, OrderSearch, Page};
use crate::session::{Fetched, Session};

/// Default number of owners whose collections are loaded per `IN (...)` query
pub const DEFAULT_BATCH_FETCH_SIZE: usize = 100;

/// Read side: the order fetch strategies
#[derive(Clone)]
pub struct OrderQueryService {
    orders: Arc<dyn OrderPort>,
    queries: Arc<dyn OrderQueryPort>,
    batch_fetch_size: usize,
}

impl OrderQueryService {
    /// Creates a service over the given ports
    pub fn new(orders: Arc<dyn OrderPort>, queries: Arc<dyn OrderQueryPort>) -> Self {
        Self {
            orders,
            queries,
            batch_fetch_size: DEFAULT_BATCH_FETCH_SIZE,
        }
    }

    /// Sets how many owners are batched into one collection query
    pub fn with_batch_fetch_size(mut self, batch_fetch_size: usize) -> Self {
        self.batch_fetch_size = batch_fetch_size.max(1);
        self
    }

    pub fn batch_fetch_size(&self) -> usize {
        self.batch_fetch_size
    }

    fn session(&self) -> Session<'_> {
        Session::new(self.orders.as_ref(), self.queries.as_ref())
    }

    // ========================================================================
    // To-one associations only
    // ========================================================================

    /// Order entities with member and delivery forced to load
    ///
    /// Lines stay unloaded and render as `null`.
    #[instrument(skip(self))]
    pub async fn simple_order_entities(
        &self,
        search: &OrderSearch,
    ) -> OrderResult<Fetched<Vec<Order>>> {
        let mut session = self.session();
        let mut orders = session.find_orders(search).await?;
        for order in orders.iter_mut() {
            session.initialize_member(order).await?;
            session.initialize_delivery(order).await?;
        }
        Ok(session.finish(orders))
    }

    /// Summaries built from entities, loading member and delivery per order
    #[instrument(skip(self))]
    pub async fn simple_orders_lazy(&self) -> OrderResult<Fetched<Vec<OrderSimpleDto>>> {
        let mut session = self.session();
        let orders = session.find_orders(&OrderSearch::default()).await?;

        let mut result = Vec::with_capacity(orders.len());
        for mut order in orders {
            session.initialize_member(&mut order).await?;
            session.initialize_delivery(&mut order).await?;
            result.push(OrderSimpleDto::from_order(&order)?);
        }
        Ok(session.finish(result))
    }

    /// Summaries built from entities fetched with member and delivery joined
    #[instrument(skip(self))]
    pub async fn simple_orders_fetch_join(&self) -> OrderResult<Fetched<Vec<OrderSimpleDto>>> {
        let mut session = self.session();
        let orders = session.find_orders_with_member_delivery(None).await?;
        let result = orders
            .iter()
            .map(OrderSimpleDto::from_order)
            .collect::<OrderResult<Vec<_>>>()?;
        Ok(session.finish(result))
    }

    /// Summaries selected straight into DTOs
    #[instrument(skip(self))]
    pub async fn simple_orders_projection(
        &self,
    ) -> OrderResult<Fetched<Vec<OrderSimpleQueryDto>>> {
        let mut session = self.session();
        let result = session.find_order_simple_query_dtos().await?;
        Ok(session.finish(result))
    }

    // ========================================================================
    // With the order line collection
    // ========================================================================

    /// Order entities with the whole graph forced to load
    #[instrument(skip(self))]
    pub async fn order_entities(&self) -> OrderResult<Fetched<Vec<Order>>> {
        let mut session = self.session();
        let mut orders = session.find_orders(&OrderSearch::default()).await?;
        for order in orders.iter_mut() {
            session.initialize_graph(order).await?;
        }
        Ok(session.finish(orders))
    }

    /// Order DTOs built from entities, loading every association lazily
    #[instrument(skip(self))]
    pub async fn orders_lazy(&self) -> OrderResult<Fetched<Vec<OrderDto>>> {
        let mut session = self.session();
        let orders = session.find_orders(&OrderSearch::default()).await?;

        let mut result = Vec::with_capacity(orders.len());
        for mut order in orders {
            session.initialize_graph(&mut order).await?;
            result.push(OrderDto::from_order(&order)?);
        }
        Ok(session.finish(result))
    }

    /// Order DTOs from one fetch join over every association
    ///
    /// The join multiplies order rows by their lines, so it cannot be paged
    /// at the order level.
    #[instrument(skip(self))]
    pub async fn orders_fetch_join(&self) -> OrderResult<Fetched<Vec<OrderDto>>> {
        let mut session = self.session();
        let orders = session.find_orders_with_items().await?;
        let result = orders
            .iter()
            .map(OrderDto::from_order)
            .collect::<OrderResult<Vec<_>>>()?;
        Ok(session.finish(result))
    }

    /// Order DTOs for one page: to-one fetch join, then batched line and item
    /// loads
    #[instrument(skip(self))]
    pub async fn orders_paged_batch(&self, page: Page) -> OrderResult<Fetched<Vec<OrderDto>>> {
        let mut session = self.session();
        let mut orders = session.find_orders_with_member_delivery(Some(page)).await?;
        session
            .batch_initialize_order_items(&mut orders, self.batch_fetch_size)
            .await?;
        let result = orders
            .iter()
            .map(OrderDto::from_order)
            .collect::<OrderResult<Vec<_>>>()?;
        Ok(session.finish(result))
    }

    /// Projected order roots, then one projection query per order for lines
    #[instrument(skip(self))]
    pub async fn orders_projection_per_order(&self) -> OrderResult<Fetched<Vec<OrderQueryDto>>> {
        let mut session = self.session();
        let mut orders = session.find_order_query_dtos().await?;
        for order in orders.iter_mut() {
            order.order_items = session.find_order_item_query_dtos(order.order_id).await?;
        }
        Ok(session.finish(orders))
    }

    /// Projected order roots, then every line in one `IN (...)` query
    #[instrument(skip(self))]
    pub async fn orders_projection_batched(&self) -> OrderResult<Fetched<Vec<OrderQueryDto>>> {
        let mut session = self.session();
        let mut orders = session.find_order_query_dtos().await?;
        if orders.is_empty() {
            return Ok(session.finish(orders));
        }

        let order_ids: Vec<OrderId> = orders.iter().map(|order| order.order_id).collect();
        let items = session.find_order_item_query_dtos_in(&order_ids).await?;
        let mut items_by_order = group_items_by_order(items);
        for order in orders.iter_mut() {
            order.attach_items(&mut items_by_order);
        }
        Ok(session.finish(orders))
    }

    /// One flat join, regrouped into orders in memory
    #[instrument(skip(self))]
    pub async fn orders_projection_flat(&self) -> OrderResult<Fetched<Vec<OrderQueryDto>>> {
        let mut session = self.session();
        let rows = session.find_order_flat_dtos().await?;
        Ok(session.finish(group_flat_rows(rows)))
    }
}

/// Write side: placing and cancelling orders
#[derive(Clone)]
pub struct OrderService {
    orders: Arc<dyn OrderPort>,
}

impl OrderService {
    pub fn new(orders: Arc<dyn OrderPort>) -> Self {
        Self { orders }
    }

    /// Places an order
    ///
    /// # Errors
    ///
    /// `EmptyOrder` or `InvalidCount` for a malformed request before touching
    /// the store; whatever the store reports otherwise, including
    /// `NotEnoughStock`.
    #[instrument(skip(self, lines), fields(member_id = %member_id, lines = lines.len()))]
    pub async fn order(&self, member_id: MemberId, lines: &[LineRequest]) -> OrderResult<OrderId> {
        if lines.is_empty() {
            return Err(OrderError::EmptyOrder);
        }
        if let Some(line) = lines.iter().find(|line| line.count <= 0) {
            return Err(OrderError::InvalidCount(line.count));
        }

        let order_id = self.orders.place_order(member_id, lines).await?;
        info!(%order_id, "Order placed");
        Ok(order_id)
    }

    /// Cancels an order
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn cancel_order(&self, order_id: OrderId) -> OrderResult<()> {
        self.orders.cancel_order(order_id).await?;
        info!("Order cancelled");
        Ok(())
    }
}
