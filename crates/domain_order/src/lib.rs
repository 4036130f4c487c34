//! Order Domain
//!
//! Members, items, orders, order lines and deliveries, together with the
//! fetch strategies that read them back.
//!
//! # Core Concepts
//!
//! - **Order**: aggregate root owning its lines and its delivery, referencing
//!   a member. Associations are [`Lazy`] and stay unloaded until a fetch
//!   strategy loads them; unloaded associations serialize as `null`.
//! - **Session**: per-request identity map that counts store round-trips.
//! - **Fetch strategies**: [`OrderQueryService`] answers the same question
//!   several ways, from one-query-per-association to single flat joins.
//! - **Projections**: query DTOs read straight from the store without
//!   building entities.
//!
//! # Order Lifecycle
//!
//! ```text
//! ORDER ──cancel──> CANCEL        (rejected once the delivery is COMP)
//! ```
//!
//! Placing an order takes stock from every item; cancelling gives it back.

pub mod address;
pub mod adapters;
pub mod delivery;
pub mod dto;
pub mod error;
pub mod item;
pub mod lazy;
pub mod member;
pub mod order;
pub mod ports;
pub mod sample;
pub mod services;
pub mod session;

pub use address::Address;
pub use adapters::InMemoryOrderStore;
pub use delivery::{Delivery, DeliveryDraft, DeliveryStatus};
pub use dto::{
    group_flat_rows, group_items_by_order, OrderDto, OrderFlatDto, OrderItemDto,
    OrderItemQueryDto, OrderQueryDto, OrderSimpleDto, OrderSimpleQueryDto,
};
pub use error::{OrderError, OrderResult};
pub use item::{Item, ItemDraft, ItemKind};
pub use lazy::Lazy;
pub use member::{Member, MemberDraft};
pub use order::{Order, OrderDraft, OrderItem, OrderLine, OrderStatus};
pub use ports::{LineRequest, OrderPort, OrderQueryPort, OrderSearch, Page, MAX_SEARCH_RESULTS};
pub use sample::{sample_orders, seed_sample_data, SampleOrder};
pub use services::{OrderQueryService, OrderService, DEFAULT_BATCH_FETCH_SIZE};
pub use session::{Fetched, Session};
