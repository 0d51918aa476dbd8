//! Order aggregate and related types.

mod aggregate;
mod item;
mod state;

pub use aggregate::Order;
pub use item::Item;
pub use state::OrderState;

use common::ItemId;
use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// The order already holds an item with this id.
    #[error("Order item already exists: {item_id}")]
    DuplicateItem { item_id: ItemId },

    /// The requested edge is not part of the transition graph.
    #[error("Invalid state transition: {from} -> {to}")]
    InvalidTransition { from: OrderState, to: OrderState },

    /// A state name did not match any known state.
    #[error("Unknown order state: {0:?}")]
    UnknownState(String),
}
