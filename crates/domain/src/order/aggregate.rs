//! Order aggregate implementation.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use common::{ItemId, OrderId};
use serde::{Deserialize, Serialize};

use super::{Item, OrderError, OrderState};

/// Order aggregate root.
///
/// Tracks a kitchen order from the moment it is received until it is
/// delivered or cancelled. Items are attached at creation time only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Identifier assigned by the upstream system.
    id: OrderId,

    /// Current production state.
    state: OrderState,

    /// When `state` last changed.
    state_updated_at: DateTime<Utc>,

    /// Items in the order, keyed by item ID.
    items: BTreeMap<ItemId, Item>,

    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Order {
    /// Creates a freshly received order with no items.
    pub fn new(id: impl Into<OrderId>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            state: OrderState::Received,
            state_updated_at: now,
            items: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuilds an order from persisted values.
    ///
    /// Used by repositories; no transition or duplicate checks are applied.
    pub fn restore(
        id: OrderId,
        state: OrderState,
        state_updated_at: DateTime<Utc>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        items: impl IntoIterator<Item = Item>,
    ) -> Self {
        Self {
            id,
            state,
            state_updated_at,
            items: items
                .into_iter()
                .map(|item| (item.id.clone(), item))
                .collect(),
            created_at,
            updated_at,
        }
    }
}

// Query methods
impl Order {
    pub fn id(&self) -> &OrderId {
        &self.id
    }

    /// Returns the current state.
    pub fn state(&self) -> OrderState {
        self.state
    }

    /// Returns the human-readable label of the current state.
    pub fn state_title(&self) -> &'static str {
        self.state.as_str()
    }

    pub fn state_updated_at(&self) -> DateTime<Utc> {
        self.state_updated_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns all items in the order.
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    /// Returns an item by ID.
    pub fn get_item(&self, item_id: &ItemId) -> Option<&Item> {
        self.items.get(item_id)
    }

    /// Returns the number of items.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the order has items.
    pub fn has_items(&self) -> bool {
        !self.items.is_empty()
    }

    /// Returns true once the order reached a terminal state.
    pub fn is_completed(&self) -> bool {
        matches!(self.state, OrderState::Delivered | OrderState::Cancelled)
    }
}

// Mutations
impl Order {
    /// Adds an item to the order.
    pub fn add_item(&mut self, item: Item, now: DateTime<Utc>) -> Result<(), OrderError> {
        if self.items.contains_key(&item.id) {
            return Err(OrderError::DuplicateItem { item_id: item.id });
        }

        self.items.insert(item.id.clone(), item);
        self.updated_at = now;
        Ok(())
    }

    /// Moves the order to `target`.
    ///
    /// Re-applying the current state succeeds without touching timestamps.
    pub fn update_state(&mut self, target: OrderState, now: DateTime<Utc>) -> Result<(), OrderError> {
        if self.state == target {
            return Ok(());
        }

        if !self.state.can_transition_to(target) {
            return Err(OrderError::InvalidTransition {
                from: self.state,
                to: target,
            });
        }

        self.state = target;
        self.state_updated_at = now;
        self.updated_at = now;
        Ok(())
    }
}
