//! Infrastructure Database Layer
//!
//! This crate provides the PostgreSQL side of the order service using SQLx.
//!
//! # Architecture
//!
//! The crate follows the repository pattern. Repositories own the SQL and
//! return plain row types; the adapter turns rows into domain entities and
//! implements the `domain_order` ports on top of them.
//!
//! - [`repositories::OrderRepository`]: entity rows, one statement per call,
//!   and the write transactions
//! - [`repositories::OrderQueryRepository`]: DTO projections
//! - [`adapters::PostgresOrderAdapter`]: `OrderPort` + `OrderQueryPort`
//!
//! Queries are checked at runtime (`sqlx::query_as::<_, Row>`), so building
//! the crate needs no database.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, DatabaseConfig, PostgresOrderAdapter};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/shop")).await?;
//! let adapter = PostgresOrderAdapter::new(pool);
//! ```

pub mod pool;
pub mod error;
pub mod repositories;
pub mod adapters;

pub use pool::{
    DatabasePool, create_pool, create_pool_from_url, run_migrations, DatabaseConfig,
    DEFAULT_DATABASE_URL,
};
pub use error::DatabaseError;
pub use adapters::PostgresOrderAdapter;
