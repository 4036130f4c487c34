//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! order service test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built shop data (addresses, members, books, loaded orders)
//! - `database`: PostgreSQL test containers with the shop schema applied
//! - `generators`: Property-based and fake data generators
//!
//! Only integration tests (`tests/` directories) should depend on this crate;
//! it depends on `domain_order` itself.

pub mod fixtures;
pub mod database;
pub mod generators;

pub use fixtures::*;
pub use database::*;
pub use generators::*;
