//! Delivery entity

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::DeliveryId;

use crate::address::Address;
use crate::error::OrderError;

/// Delivery progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    /// Waiting to ship
    Ready,
    /// Delivered
    Comp,
}

impl DeliveryStatus {
    /// Returns the stored representation
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Ready => "READY",
            DeliveryStatus::Comp => "COMP",
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "READY" => Ok(DeliveryStatus::Ready),
            "COMP" => Ok(DeliveryStatus::Comp),
            other => Err(OrderError::UnknownStatus(other.to_string())),
        }
    }
}

/// Delivery of exactly one order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
    pub id: DeliveryId,
    pub address: Address,
    pub status: DeliveryStatus,
}

/// A delivery that has not been persisted yet
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryDraft {
    pub address: Address,
    pub status: DeliveryStatus,
}

impl DeliveryDraft {
    /// A fresh delivery waiting to ship
    pub fn ready(address: Address) -> Self {
        Self {
            address,
            status: DeliveryStatus::Ready,
        }
    }

    pub fn into_delivery(self, id: DeliveryId) -> Delivery {
        Delivery {
            id,
            address: self.address,
            status: self.status,
        }
    }
}
