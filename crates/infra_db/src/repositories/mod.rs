//! Repository implementations for the shop schema
//!
//! Repositories encapsulate SQL queries and return plain row types; mapping
//! rows onto domain types is left to the adapter.
//!
//! # Architecture
//!
//! Each repository follows these principles:
//! - Every read method is exactly one SQL statement
//! - Writes run in a single transaction
//! - Concurrency is handled with guarded updates (`WHERE stock_quantity >= $1`,
//!   `WHERE status = 'ORDER'`) rather than version columns

pub mod order;
pub mod order_query;

pub use order::OrderRepository;
pub use order_query::OrderQueryRepository;
