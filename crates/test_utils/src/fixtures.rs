//! Pre-built Test Fixtures
//!
//! Provides ready-to-use shop data mirroring the sample orders. These
//! fixtures are consistent and predictable so tests can assert exact values.

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;

use core_kernel::{DeliveryId, ItemId, MemberId, OrderId, OrderItemId};
use domain_order::{
    Address, Delivery, DeliveryStatus, Item, ItemDraft, Member, Order, OrderItem, OrderStatus,
};

static ORDER_DATE: Lazy<NaiveDateTime> = Lazy::new(|| {
    NaiveDate::from_ymd_opt(2024, 1, 15)
        .and_then(|date| date.and_hms_opt(10, 30, 0))
        .expect("valid fixture date")
});

/// Fixture for shop test data
pub struct ShopFixtures;

impl ShopFixtures {
    /// userA's address
    pub fn seoul() -> Address {
        Address::new("Seoul", "1", "1111")
    }

    /// userB's address
    pub fn jinju() -> Address {
        Address::new("Jinju", "2", "2222")
    }

    pub fn user_a() -> Member {
        Member {
            id: MemberId::new(1),
            name: "userA".to_string(),
            address: Self::seoul(),
        }
    }

    pub fn user_b() -> Member {
        Member {
            id: MemberId::new(2),
            name: "userB".to_string(),
            address: Self::jinju(),
        }
    }

    /// A book with the given id
    pub fn book(id: i64, name: &str, price: i32, stock_quantity: i32) -> Item {
        ItemDraft::book(name, price, stock_quantity).into_item(ItemId::new(id))
    }

    pub fn jpa1_book() -> Item {
        Self::book(10, "JPA1 BOOK", 10000, 100)
    }

    pub fn jpa2_book() -> Item {
        Self::book(11, "JPA2 BOOK", 20000, 100)
    }

    /// Fixed order timestamp
    pub fn order_date() -> NaiveDateTime {
        *ORDER_DATE
    }

    /// A delivery waiting to ship
    pub fn ready_delivery(id: i64, address: Address) -> Delivery {
        Delivery {
            id: DeliveryId::new(id),
            address,
            status: DeliveryStatus::Ready,
        }
    }

    /// An order with every association loaded
    ///
    /// The delivery shares the order's id value; line ids are
    /// `order_id * 100 + position`.
    pub fn loaded_order(order_id: i64, member: Member, lines: Vec<(Item, i32)>) -> Order {
        let id = OrderId::new(order_id);
        let delivery = Self::ready_delivery(order_id, member.address.clone());

        let mut order = Order::unloaded(
            id,
            member.id,
            delivery.id,
            Self::order_date(),
            OrderStatus::Order,
        );

        let order_items = lines
            .into_iter()
            .enumerate()
            .map(|(position, (item, count))| {
                let mut line = OrderItem::unloaded(
                    OrderItemId::new(order_id * 100 + position as i64),
                    id,
                    item.id,
                    item.price,
                    count,
                );
                line.item.set(item);
                line
            })
            .collect();

        order.member.set(member);
        order.delivery.set(delivery);
        order.order_items.set(order_items);
        order
    }

    /// userA's sample order: one JPA1 book and two JPA2 books
    pub fn user_a_order() -> Order {
        Self::loaded_order(
            1,
            Self::user_a(),
            vec![(Self::jpa1_book(), 1), (Self::jpa2_book(), 2)],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_a_order_fully_loaded() {
        let order = ShopFixtures::user_a_order();
        assert!(order.member.is_loaded());
        assert!(order.delivery.is_loaded());
        assert_eq!(order.order_items.get().map(Vec::len), Some(2));
        assert_eq!(order.total_price().unwrap(), 50000);
    }

    #[test]
    fn test_delivery_at_member_address() {
        let order = ShopFixtures::user_a_order();
        assert_eq!(order.delivery.get().unwrap().address, ShopFixtures::seoul());
    }
}
