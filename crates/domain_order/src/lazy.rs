//! Lazily loaded associations
//!
//! An entity fetched without its associations holds `Lazy::Unloaded` in their
//! place. Something (a fetch join, a follow-up query, a batch load) must put
//! the value in before the association can be read. Unloaded associations
//! render as JSON `null`, so an entity serialized straight out of a query only
//! shows what that query actually fetched.

use serde::{Serialize, Serializer};

use crate::error::OrderError;

/// An association that may not have been loaded yet
#[derive(Debug, Clone, PartialEq)]
pub enum Lazy<T> {
    Unloaded,
    Loaded(T),
}

impl<T> Default for Lazy<T> {
    fn default() -> Self {
        Lazy::Unloaded
    }
}

impl<T> Lazy<T> {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Lazy::Loaded(_))
    }

    pub fn get(&self) -> Option<&T> {
        match self {
            Lazy::Loaded(value) => Some(value),
            Lazy::Unloaded => None,
        }
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        match self {
            Lazy::Loaded(value) => Some(value),
            Lazy::Unloaded => None,
        }
    }

    /// Stores a loaded value
    pub fn set(&mut self, value: T) {
        *self = Lazy::Loaded(value);
    }

    /// Borrows the loaded value
    ///
    /// # Errors
    ///
    /// `OrderError::LazyNotLoaded` naming the association when nothing has
    /// loaded it yet.
    pub fn require(&self, association: &'static str) -> Result<&T, OrderError> {
        self.get().ok_or(OrderError::LazyNotLoaded(association))
    }

    pub fn require_mut(&mut self, association: &'static str) -> Result<&mut T, OrderError> {
        self.get_mut().ok_or(OrderError::LazyNotLoaded(association))
    }
}

impl<T> From<T> for Lazy<T> {
    fn from(value: T) -> Self {
        Lazy::Loaded(value)
    }
}

impl<T: Serialize> Serialize for Lazy<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Lazy::Loaded(value) => serializer.serialize_some(value),
            Lazy::Unloaded => serializer.serialize_none(),
        }
    }
}
