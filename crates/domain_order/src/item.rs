//! Catalog items
//!
//! Items use single-table inheritance: every kind shares `name`, `price` and
//! `stock_quantity`, and the kind-specific columns sit next to a one-letter
//! `dtype` discriminator.

use serde::{Deserialize, Serialize};

use core_kernel::ItemId;

use crate::error::OrderError;

/// Kind-specific item attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "itemType")]
pub enum ItemKind {
    Book {
        author: Option<String>,
        isbn: Option<String>,
    },
    Album {
        artist: Option<String>,
        etc: Option<String>,
    },
    Movie {
        director: Option<String>,
        actor: Option<String>,
    },
}

impl ItemKind {
    /// Discriminator value stored in the `dtype` column
    pub fn dtype(&self) -> &'static str {
        match self {
            ItemKind::Book { .. } => "B",
            ItemKind::Album { .. } => "A",
            ItemKind::Movie { .. } => "M",
        }
    }

    /// A book with no author or isbn recorded
    pub fn book() -> Self {
        ItemKind::Book {
            author: None,
            isbn: None,
        }
    }
}

/// A catalog item with stock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub price: i32,
    pub stock_quantity: i32,
    #[serde(flatten)]
    pub kind: ItemKind,
}

impl Item {
    /// Adds stock back, e.g. when an order is cancelled
    ///
    /// Saturates at `i32::MAX`.
    pub fn add_stock(&mut self, quantity: i32) {
        self.stock_quantity = self.stock_quantity.saturating_add(quantity);
    }

    /// Removes stock for an order line
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotEnoughStock` if fewer than `quantity` units remain;
    /// the stock is left untouched in that case.
    pub fn remove_stock(&mut self, quantity: i32) -> Result<(), OrderError> {
        let rest = self.stock_quantity - quantity;
        if rest < 0 {
            return Err(OrderError::NotEnoughStock {
                item: self.name.clone(),
                requested: quantity,
                available: self.stock_quantity,
            });
        }
        self.stock_quantity = rest;
        Ok(())
    }
}

/// An item that has not been persisted yet
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDraft {
    pub name: String,
    pub price: i32,
    pub stock_quantity: i32,
    pub kind: ItemKind,
}

impl ItemDraft {
    /// Creates a book draft
    pub fn book(name: impl Into<String>, price: i32, stock_quantity: i32) -> Self {
        Self {
            name: name.into(),
            price,
            stock_quantity,
            kind: ItemKind::book(),
        }
    }

    pub fn into_item(self, id: ItemId) -> Item {
        Item {
            id,
            name: self.name,
            price: self.price,
            stock_quantity: self.stock_quantity,
            kind: self.kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(stock: i32) -> Item {
        ItemDraft::book("JPA1 BOOK", 10000, stock).into_item(ItemId::new(1))
    }

    #[test]
    fn test_remove_stock() {
        let mut item = book(10);
        item.remove_stock(4).unwrap();
        assert_eq!(item.stock_quantity, 6);
    }

    #[test]
    fn test_remove_all_stock() {
        let mut item = book(3);
        item.remove_stock(3).unwrap();
        assert_eq!(item.stock_quantity, 0);
    }

    #[test]
    fn test_remove_stock_insufficient_leaves_stock() {
        let mut item = book(2);
        let err = item.remove_stock(3).unwrap_err();
        assert!(matches!(err, OrderError::NotEnoughStock { available: 2, .. }));
        assert_eq!(item.stock_quantity, 2);
    }

    #[test]
    fn test_add_stock() {
        let mut item = book(2);
        item.add_stock(3);
        assert_eq!(item.stock_quantity, 5);
    }

    #[test]
    fn test_add_stock_saturates() {
        let mut item = book(i32::MAX - 1);
        item.add_stock(5);
        assert_eq!(item.stock_quantity, i32::MAX);
    }

    #[test]
    fn test_item_json_has_kind_tag() {
        let json = serde_json::to_value(book(1)).unwrap();
        assert_eq!(json["itemType"], "Book");
        assert_eq!(json["stockQuantity"], 1);
    }

    #[test]
    fn test_dtype() {
        assert_eq!(ItemKind::book().dtype(), "B");
        let movie = ItemKind::Movie { director: None, actor: None };
        assert_eq!(movie.dtype(), "M");
    }
}
