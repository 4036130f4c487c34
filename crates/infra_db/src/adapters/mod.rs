//! Domain Adapters
//!
//! Adapter implementations for the order ports, connecting them to the
//! PostgreSQL repositories.
//!
//! # Architecture
//!
//! The adapter:
//! - Implements `OrderPort` and `OrderQueryPort`
//! - Translates between domain models and database row types
//! - Runs the order rules (stock, cancellation) before handing writes to the
//!   repository
//!
//! # Usage
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresOrderAdapter;
//! use domain_order::{OrderPort, OrderSearch};
//!
//! let adapter = PostgresOrderAdapter::new(pool);
//! let orders = adapter.find_orders(&OrderSearch::default()).await?;
//! ```

pub mod order;

pub use order::PostgresOrderAdapter;
