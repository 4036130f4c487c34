//! Sample shop data
//!
//! Two members with two book orders each. Small on purpose: with two orders
//! the N+1 strategies already issue visibly more round-trips than the joined
//! ones.

use tracing::info;

use crate::address::Address;
use crate::error::OrderResult;
use crate::item::ItemDraft;
use crate::member::MemberDraft;
use crate::ports::{LineRequest, OrderPort, OrderSearch};

/// One member's sample order: who, and which books in what quantity
#[derive(Debug, Clone)]
pub struct SampleOrder {
    pub member: MemberDraft,
    pub lines: Vec<(ItemDraft, i32)>,
}

/// The sample orders, in insertion order
pub fn sample_orders() -> Vec<SampleOrder> {
    vec![
        SampleOrder {
            member: MemberDraft::new("userA", Address::new("Seoul", "1", "1111")),
            lines: vec![
                (ItemDraft::book("JPA1 BOOK", 10000, 100), 1),
                (ItemDraft::book("JPA2 BOOK", 20000, 100), 2),
            ],
        },
        SampleOrder {
            member: MemberDraft::new("userB", Address::new("Jinju", "2", "2222")),
            lines: vec![
                (ItemDraft::book("SPRING1 BOOK", 20000, 200), 3),
                (ItemDraft::book("SPRING2 BOOK", 40000, 300), 4),
            ],
        },
    ]
}

/// Inserts the sample data unless the store already holds orders
///
/// # Returns
///
/// `true` if the data was inserted
pub async fn seed_sample_data(port: &dyn OrderPort) -> OrderResult<bool> {
    if !port.find_orders(&OrderSearch::default()).await?.is_empty() {
        info!("Orders already present, skipping sample data");
        return Ok(false);
    }

    for sample in sample_orders() {
        let member_id = port.join_member(sample.member).await?;

        let mut lines = Vec::with_capacity(sample.lines.len());
        for (draft, count) in sample.lines {
            let item_id = port.register_item(draft).await?;
            lines.push(LineRequest { item_id, count });
        }

        let order_id = port.place_order(member_id, &lines).await?;
        info!(%member_id, %order_id, "Seeded sample order");
    }
    Ok(true)
}
