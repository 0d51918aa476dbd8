//! Items of an order.

use common::ItemId;
use serde::{Deserialize, Serialize};

/// A line of an order as prepared by the kitchen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Identifier, unique within the parent order.
    pub id: ItemId,

    /// Human-readable product name.
    pub name: String,

    /// Quantity ordered.
    pub quantity: u32,
}

impl Item {
    /// Creates a new item.
    pub fn new(id: impl Into<ItemId>, name: impl Into<String>, quantity: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            quantity,
        }
    }
}
