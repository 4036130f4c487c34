//! Response DTOs
//!
//! Two families live here. `OrderSimpleDto`, `OrderDto` and `OrderItemDto`
//! are built from loaded entity graphs, so building one forces whatever
//! associations it reads to be loaded first. The `*QueryDto` and
//! `OrderFlatDto` types are filled straight from query projections and never
//! touch an entity.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use core_kernel::OrderId;

use crate::address::Address;
use crate::error::OrderResult;
use crate::order::{Order, OrderItem, OrderStatus};

/// Order summary built from an order with its member and delivery loaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSimpleDto {
    pub order_id: OrderId,
    pub name: String,
    pub order_date: NaiveDateTime,
    pub order_status: OrderStatus,
    pub address: Address,
}

impl OrderSimpleDto {
    pub fn from_order(order: &Order) -> OrderResult<Self> {
        Ok(Self {
            order_id: order.id,
            name: order.member.require("member")?.name.clone(),
            order_date: order.order_date,
            order_status: order.status,
            address: order.delivery.require("delivery")?.address.clone(),
        })
    }
}

/// Order summary projected directly by a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSimpleQueryDto {
    pub order_id: OrderId,
    pub name: String,
    pub order_date: NaiveDateTime,
    pub order_status: OrderStatus,
    pub address: Address,
}

/// Order line as exposed by entity-based endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemDto {
    pub item_name: String,
    pub order_price: i32,
    pub count: i32,
}

impl OrderItemDto {
    pub fn from_order_item(order_item: &OrderItem) -> OrderResult<Self> {
        Ok(Self {
            item_name: order_item.item.require("orderItems.item")?.name.clone(),
            order_price: order_item.order_price,
            count: order_item.count,
        })
    }
}

/// Order with lines, built from a fully loaded order graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDto {
    pub order_id: OrderId,
    pub name: String,
    pub order_date: NaiveDateTime,
    pub order_status: OrderStatus,
    pub address: Address,
    pub order_items: Vec<OrderItemDto>,
}

impl OrderDto {
    pub fn from_order(order: &Order) -> OrderResult<Self> {
        let order_items = order
            .order_items
            .require("orderItems")?
            .iter()
            .map(OrderItemDto::from_order_item)
            .collect::<OrderResult<Vec<_>>>()?;

        Ok(Self {
            order_id: order.id,
            name: order.member.require("member")?.name.clone(),
            order_date: order.order_date,
            order_status: order.status,
            address: order.delivery.require("delivery")?.address.clone(),
            order_items,
        })
    }
}

/// Order line projected directly by a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemQueryDto {
    #[serde(skip)]
    pub order_id: OrderId,
    pub item_name: String,
    pub order_price: i32,
    pub count: i32,
}

/// Order with lines assembled from query projections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderQueryDto {
    pub order_id: OrderId,
    pub name: String,
    pub order_date: NaiveDateTime,
    pub order_status: OrderStatus,
    pub address: Address,
    pub order_items: Vec<OrderItemQueryDto>,
}

impl OrderQueryDto {
    /// Fills `order_items` from a map keyed by order id, leaving orders with
    /// no lines with an empty list
    pub fn attach_items(&mut self, items_by_order: &mut HashMap<OrderId, Vec<OrderItemQueryDto>>) {
        self.order_items = items_by_order.remove(&self.order_id).unwrap_or_default();
    }
}

/// One row per order line, with the order columns repeated on every row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFlatDto {
    pub order_id: OrderId,
    pub name: String,
    pub order_date: NaiveDateTime,
    pub order_status: OrderStatus,
    pub address: Address,
    pub item_name: String,
    pub order_price: i32,
    pub count: i32,
}

/// Groups order lines by their owning order, keeping row order within a group
pub fn group_items_by_order(
    items: Vec<OrderItemQueryDto>,
) -> HashMap<OrderId, Vec<OrderItemQueryDto>> {
    let mut grouped: HashMap<OrderId, Vec<OrderItemQueryDto>> = HashMap::new();
    for item in items {
        grouped.entry(item.order_id).or_default().push(item);
    }
    grouped
}

/// Rebuilds nested orders from flat rows
///
/// Rows are grouped by `order_id`. The order columns of the first row seen for
/// an order win; orders come out in the order they first appear and each
/// order's lines keep their row order.
pub fn group_flat_rows(rows: Vec<OrderFlatDto>) -> Vec<OrderQueryDto> {
    let mut positions: HashMap<OrderId, usize> = HashMap::new();
    let mut orders: Vec<OrderQueryDto> = Vec::new();

    for row in rows {
        let line = OrderItemQueryDto {
            order_id: row.order_id,
            item_name: row.item_name,
            order_price: row.order_price,
            count: row.count,
        };

        match positions.get(&row.order_id) {
            Some(&position) => orders[position].order_items.push(line),
            None => {
                positions.insert(row.order_id, orders.len());
                orders.push(OrderQueryDto {
                    order_id: row.order_id,
                    name: row.name,
                    order_date: row.order_date,
                    order_status: row.order_status,
                    address: row.address,
                    order_items: vec![line],
                });
            }
        }
    }

    orders
}
