//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating shop data that keeps the
//! domain's shape, plus `fake`-backed helpers for realistic one-off values.

use chrono::{DateTime, NaiveDateTime};
use fake::faker::address::en::{CityName, StreetName, ZipCode};
use fake::faker::lorem::en::Word;
use fake::faker::name::en::Name;
use fake::Fake;
use proptest::prelude::*;

use core_kernel::OrderId;
use domain_order::{Address, ItemDraft, MemberDraft, OrderFlatDto, OrderStatus};

/// Strategy for generating order statuses
pub fn order_status_strategy() -> impl Strategy<Value = OrderStatus> {
    prop_oneof![Just(OrderStatus::Order), Just(OrderStatus::Cancel)]
}

/// Strategy for generating addresses
pub fn address_strategy() -> impl Strategy<Value = Address> {
    ("[A-Z][a-z]{2,10}", "[0-9]{1,3}", "[0-9]{4,5}")
        .prop_map(|(city, street, zipcode)| Address::new(city, street, zipcode))
}

/// Strategy for generating timestamps within 2024, whole seconds
pub fn order_date_strategy() -> impl Strategy<Value = NaiveDateTime> {
    (1_704_067_200i64..1_735_689_600i64).prop_map(|secs| {
        DateTime::from_timestamp(secs, 0)
            .map(|dt| dt.naive_utc())
            .unwrap_or_default()
    })
}

/// Strategy for generating one order line as (item name, price, count)
pub fn line_strategy() -> impl Strategy<Value = (String, i32, i32)> {
    ("[A-Z]{3,8} BOOK", 1_000i32..100_000, 1i32..20)
}

/// Strategy for generating the rows of a flat order/line join
///
/// Orders get strictly increasing ids and at least one line each; rows are
/// ordered by order id, then line position, as the flat query returns them.
pub fn flat_rows_strategy(max_orders: usize) -> impl Strategy<Value = Vec<OrderFlatDto>> {
    let order = (
        "user[A-Z]",
        order_date_strategy(),
        order_status_strategy(),
        address_strategy(),
        prop::collection::vec(line_strategy(), 1..5),
    );

    prop::collection::vec(order, 0..=max_orders).prop_map(|orders| {
        orders
            .into_iter()
            .enumerate()
            .flat_map(|(index, (name, order_date, order_status, address, lines))| {
                let order_id = OrderId::new(index as i64 + 1);
                lines
                    .into_iter()
                    .map(move |(item_name, order_price, count)| OrderFlatDto {
                        order_id,
                        name: name.clone(),
                        order_date,
                        order_status,
                        address: address.clone(),
                        item_name,
                        order_price,
                        count,
                    })
            })
            .collect()
    })
}

/// A member with a fake name and address
pub fn fake_member_draft() -> MemberDraft {
    let address = Address::new(
        CityName().fake::<String>(),
        StreetName().fake::<String>(),
        ZipCode().fake::<String>(),
    );
    MemberDraft::new(Name().fake::<String>(), address)
}

/// A book with a fake title, a price and plenty of stock
pub fn fake_book_draft() -> ItemDraft {
    let title: String = Word().fake();
    ItemDraft::book(
        format!("{} BOOK", title.to_uppercase()),
        (1_000..50_000).fake::<i32>(),
        (100..1_000).fake::<i32>(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn flat_rows_are_ordered_by_order(rows in flat_rows_strategy(6)) {
            for pair in rows.windows(2) {
                prop_assert!(pair[0].order_id <= pair[1].order_id);
            }
        }

        #[test]
        fn lines_have_positive_counts((_, price, count) in line_strategy()) {
            prop_assert!(price > 0);
            prop_assert!(count > 0);
        }
    }

    #[test]
    fn test_fake_drafts_are_filled() {
        let member = fake_member_draft();
        assert!(!member.name.is_empty());

        let book = fake_book_draft();
        assert!(book.name.ends_with(" BOOK"));
        assert!(book.stock_quantity >= 100);
    }
}
