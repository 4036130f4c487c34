//! Order domain errors

use thiserror::Error;

use core_kernel::{OrderId, PortError};

/// Errors raised by order rules and fetch strategies
#[derive(Debug, Error)]
pub enum OrderError {
    /// Not enough stock left to cover an order line
    #[error("Not enough stock for {item}: requested {requested}, available {available}")]
    NotEnoughStock {
        item: String,
        requested: i32,
        available: i32,
    },

    /// Delivered orders cannot be cancelled
    #[error("Order {0} has already been delivered and cannot be cancelled")]
    AlreadyDelivered(OrderId),

    #[error("Order {0} is already cancelled")]
    AlreadyCancelled(OrderId),

    /// An order needs at least one line
    #[error("An order must contain at least one item")]
    EmptyOrder,

    /// Order line quantities must be positive
    #[error("Invalid order count {0}: must be positive")]
    InvalidCount(i32),

    /// An association was read before anything loaded it
    #[error("Association '{0}' was read before it was loaded")]
    LazyNotLoaded(&'static str),

    /// A stored status value has no domain counterpart
    #[error("Unknown status value: {0}")]
    UnknownStatus(String),

    /// Failure in the backing store
    #[error(transparent)]
    Port(#[from] PortError),
}

impl OrderError {
    /// Returns true if the error comes from an order rule rather than the store
    pub fn is_rule_violation(&self) -> bool {
        matches!(
            self,
            OrderError::NotEnoughStock { .. }
                | OrderError::AlreadyDelivered(_)
                | OrderError::AlreadyCancelled(_)
                | OrderError::EmptyOrder
                | OrderError::InvalidCount(_)
        )
    }
}

/// Result type for order operations
pub type OrderResult<T> = Result<T, OrderError>;
