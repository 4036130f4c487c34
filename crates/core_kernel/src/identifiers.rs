//! Strongly-typed identifiers for shop entities
//!
//! Every table in the shop schema is keyed by a `BIGSERIAL`. Wrapping the raw
//! `i64` keys in newtypes keeps an `ItemId` from being passed where an
//! `OrderId` is expected, which matters a lot in code that shuffles ids
//! between batched `IN (...)` queries.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Creates from a raw database key
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// Returns the raw database key
            pub const fn value(&self) -> i64 {
                self.0
            }

            /// Returns the identifier prefix for display
            pub fn prefix() -> &'static str {
                $prefix
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                // Strip prefix if present
                let raw = s.strip_prefix(concat!($prefix, "-")).unwrap_or(s);
                Ok(Self(raw.parse()?))
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> i64 {
                id.0
            }
        }
    };
}

define_id!(MemberId, "MEM");
define_id!(OrderId, "ORD");
define_id!(OrderItemId, "ORDI");
define_id!(DeliveryId, "DLV");
define_id!(ItemId, "ITM");

/// Collects the raw keys of a set of identifiers, for binding to `ANY($1)`
pub fn raw_keys<I, T>(ids: I) -> Vec<i64>
where
    I: IntoIterator<Item = T>,
    T: Into<i64>,
{
    ids.into_iter().map(Into::into).collect()
}
