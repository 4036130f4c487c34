//! Address value object

use serde::{Deserialize, Serialize};

/// A postal address embedded in members and deliveries
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    pub city: String,
    pub street: String,
    pub zipcode: String,
}

impl Address {
    /// Creates a new address
    pub fn new(
        city: impl Into<String>,
        street: impl Into<String>,
        zipcode: impl Into<String>,
    ) -> Self {
        Self {
            city: city.into(),
            street: street.into(),
            zipcode: zipcode.into(),
        }
    }

    /// Formats address for display
    pub fn format(&self) -> String {
        format!("{} {} ({})", self.city, self.street, self.zipcode)
    }
}
