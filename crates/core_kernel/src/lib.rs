//! Core Kernel - Foundational types shared by the order service crates
//!
//! This crate provides the building blocks used by every other crate:
//! - Strongly-typed entity identifiers
//! - Port error and health-check types for the ports and adapters layer
//! - Common error type

pub mod identifiers;
pub mod error;
pub mod ports;

pub use identifiers::{MemberId, OrderId, OrderItemId, DeliveryId, ItemId, raw_keys};
pub use error::CoreError;
pub use ports::{PortError, DomainPort, AdapterHealth, HealthCheckResult, HealthCheckable};
