//! Order aggregate
//!
//! An `Order` references its member and delivery (to-one) and owns a
//! collection of `OrderItem`s (to-many), each of which references a catalog
//! `Item`. All four associations are lazy: what is loaded depends entirely on
//! how the order was fetched.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{DeliveryId, ItemId, MemberId, OrderId, OrderItemId};

use crate::delivery::{Delivery, DeliveryDraft, DeliveryStatus};
use crate::error::{OrderError, OrderResult};
use crate::item::Item;
use crate::lazy::Lazy;
use crate::member::Member;

/// Order lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Order,
    Cancel,
}

impl OrderStatus {
    /// Returns the stored representation
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Order => "ORDER",
            OrderStatus::Cancel => "CANCEL",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ORDER" => Ok(OrderStatus::Order),
            "CANCEL" => Ok(OrderStatus::Cancel),
            other => Err(OrderError::UnknownStatus(other.to_string())),
        }
    }
}

/// One line of an order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: OrderItemId,
    #[serde(skip)]
    pub order_id: OrderId,
    #[serde(skip)]
    pub item_id: ItemId,
    pub item: Lazy<Item>,
    /// Unit price at the time of ordering
    pub order_price: i32,
    pub count: i32,
}

impl OrderItem {
    /// Creates a line whose item has not been loaded
    pub fn unloaded(
        id: OrderItemId,
        order_id: OrderId,
        item_id: ItemId,
        order_price: i32,
        count: i32,
    ) -> Self {
        Self {
            id,
            order_id,
            item_id,
            item: Lazy::Unloaded,
            order_price,
            count,
        }
    }

    pub fn total_price(&self) -> i64 {
        i64::from(self.order_price) * i64::from(self.count)
    }

    /// Returns the ordered quantity to the item's stock
    fn cancel(&mut self) -> OrderResult<()> {
        self.item.require_mut("orderItems.item")?.add_stock(self.count);
        Ok(())
    }
}

/// The order aggregate root
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    #[serde(skip)]
    pub member_id: MemberId,
    pub member: Lazy<Member>,
    pub order_items: Lazy<Vec<OrderItem>>,
    #[serde(skip)]
    pub delivery_id: DeliveryId,
    pub delivery: Lazy<Delivery>,
    pub order_date: NaiveDateTime,
    pub status: OrderStatus,
}

impl Order {
    /// Creates an order whose associations have not been loaded
    pub fn unloaded(
        id: OrderId,
        member_id: MemberId,
        delivery_id: DeliveryId,
        order_date: NaiveDateTime,
        status: OrderStatus,
    ) -> Self {
        Self {
            id,
            member_id,
            member: Lazy::Unloaded,
            order_items: Lazy::Unloaded,
            delivery_id,
            delivery: Lazy::Unloaded,
            order_date,
            status,
        }
    }

    /// Sum of all line totals
    pub fn total_price(&self) -> OrderResult<i64> {
        Ok(self
            .order_items
            .require("orderItems")?
            .iter()
            .map(OrderItem::total_price)
            .sum())
    }

    /// Cancels the order and restocks every line
    ///
    /// Requires the delivery, the order items and each line's item to be
    /// loaded.
    ///
    /// # Errors
    ///
    /// - `AlreadyCancelled` if the order is cancelled
    /// - `AlreadyDelivered` if the delivery has completed
    pub fn cancel(&mut self) -> OrderResult<()> {
        if self.status == OrderStatus::Cancel {
            return Err(OrderError::AlreadyCancelled(self.id));
        }
        if self.delivery.require("delivery")?.status == DeliveryStatus::Comp {
            return Err(OrderError::AlreadyDelivered(self.id));
        }

        for order_item in self.order_items.require_mut("orderItems")? {
            order_item.cancel()?;
        }
        self.status = OrderStatus::Cancel;
        Ok(())
    }
}

/// A priced order line that has not been persisted yet
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLine {
    pub item_id: ItemId,
    pub order_price: i32,
    pub count: i32,
}

impl OrderLine {
    /// Prices a line at the item's current price and takes the stock
    ///
    /// # Errors
    ///
    /// `InvalidCount` for a non-positive count, `NotEnoughStock` when the
    /// item cannot cover it.
    pub fn create(item: &mut Item, count: i32) -> OrderResult<Self> {
        if count <= 0 {
            return Err(OrderError::InvalidCount(count));
        }
        item.remove_stock(count)?;

        Ok(Self {
            item_id: item.id,
            order_price: item.price,
            count,
        })
    }
}

/// An order that has not been persisted yet
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDraft {
    pub member_id: MemberId,
    pub delivery: DeliveryDraft,
    pub lines: Vec<OrderLine>,
    pub order_date: NaiveDateTime,
    pub status: OrderStatus,
}

impl OrderDraft {
    /// Creates an order shipped to the member's own address
    ///
    /// # Errors
    ///
    /// `EmptyOrder` when `lines` is empty.
    pub fn create(
        member: &Member,
        lines: Vec<OrderLine>,
        order_date: NaiveDateTime,
    ) -> OrderResult<Self> {
        if lines.is_empty() {
            return Err(OrderError::EmptyOrder);
        }

        Ok(Self {
            member_id: member.id,
            delivery: DeliveryDraft::ready(member.address.clone()),
            lines,
            order_date,
            status: OrderStatus::Order,
        })
    }

    pub fn total_price(&self) -> i64 {
        self.lines
            .iter()
            .map(|line| i64::from(line.order_price) * i64::from(line.count))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;
    use crate::item::ItemDraft;
    use chrono::NaiveDate;

    fn order_date() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn loaded_order(delivery_status: DeliveryStatus) -> Order {
        let mut order = Order::unloaded(
            OrderId::new(1),
            MemberId::new(1),
            DeliveryId::new(1),
            order_date(),
            OrderStatus::Order,
        );
        order.delivery.set(Delivery {
            id: DeliveryId::new(1),
            address: Address::new("Seoul", "1", "1111"),
            status: delivery_status,
        });
        let mut line = OrderItem::unloaded(OrderItemId::new(1), order.id, ItemId::new(1), 10000, 2);
        line.item.set(ItemDraft::book("JPA1 BOOK", 10000, 98).into_item(ItemId::new(1)));
        order.order_items.set(vec![line]);
        order
    }

    #[test]
    fn test_status_roundtrip_through_str() {
        for status in [OrderStatus::Order, OrderStatus::Cancel] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_cancel_restocks() {
        let mut order = loaded_order(DeliveryStatus::Ready);
        order.cancel().unwrap();

        assert_eq!(order.status, OrderStatus::Cancel);
        let items = order.order_items.get().unwrap();
        assert_eq!(items[0].item.get().unwrap().stock_quantity, 100);
    }

    #[test]
    fn test_cancel_delivered_rejected() {
        let mut order = loaded_order(DeliveryStatus::Comp);
        let err = order.cancel().unwrap_err();
        assert!(matches!(err, OrderError::AlreadyDelivered(_)));
        assert_eq!(order.status, OrderStatus::Order);
    }

    #[test]
    fn test_cancel_twice_rejected() {
        let mut order = loaded_order(DeliveryStatus::Ready);
        order.cancel().unwrap();
        assert!(matches!(order.cancel(), Err(OrderError::AlreadyCancelled(_))));
    }

    #[test]
    fn test_cancel_requires_loaded_delivery() {
        let mut order = loaded_order(DeliveryStatus::Ready);
        order.delivery = Lazy::Unloaded;
        assert!(matches!(order.cancel(), Err(OrderError::LazyNotLoaded("delivery"))));
    }

    #[test]
    fn test_total_price() {
        let order = loaded_order(DeliveryStatus::Ready);
        assert_eq!(order.total_price().unwrap(), 20000);
    }

    #[test]
    fn test_unloaded_associations_render_null() {
        let order = Order::unloaded(
            OrderId::new(4),
            MemberId::new(2),
            DeliveryId::new(3),
            order_date(),
            OrderStatus::Order,
        );
        let json = serde_json::to_value(&order).unwrap();

        assert_eq!(json["id"], 4);
        assert!(json["member"].is_null());
        assert!(json["delivery"].is_null());
        assert!(json["orderItems"].is_null());
        assert_eq!(json["status"], "ORDER");
        assert!(json.get("memberId").is_none());
    }

    #[test]
    fn test_order_line_prices_at_item_price() {
        let mut item = ItemDraft::book("JPA2 BOOK", 20000, 100).into_item(ItemId::new(2));
        let line = OrderLine::create(&mut item, 2).unwrap();

        assert_eq!(line.order_price, 20000);
        assert_eq!(item.stock_quantity, 98);
    }

    #[test]
    fn test_order_line_rejects_non_positive_count() {
        let mut item = ItemDraft::book("JPA2 BOOK", 20000, 100).into_item(ItemId::new(2));
        assert!(matches!(OrderLine::create(&mut item, 0), Err(OrderError::InvalidCount(0))));
        assert_eq!(item.stock_quantity, 100);
    }

    #[test]
    fn test_draft_requires_lines() {
        let member = Member {
            id: MemberId::new(1),
            name: "userA".to_string(),
            address: Address::new("Seoul", "1", "1111"),
        };
        let err = OrderDraft::create(&member, vec![], order_date()).unwrap_err();
        assert!(matches!(err, OrderError::EmptyOrder));
    }
}
