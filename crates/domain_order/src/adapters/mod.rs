//! Domain Adapters
//!
//! Adapters that live inside the domain crate because they need nothing but
//! the domain itself. The PostgreSQL adapter lives in `infra_db`.

pub mod memory;

pub use memory::InMemoryOrderStore;
