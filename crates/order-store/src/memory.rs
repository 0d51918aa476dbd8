use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::OrderId;
use domain::{Order, OrderState};
use tokio::sync::RwLock;

use crate::{OrderRepository, Result, StoreError};

#[derive(Default)]
struct InMemoryState {
    orders: HashMap<OrderId, Order>,
    fail_on_create: bool,
    unavailable: bool,
}

/// In-memory order repository for tests and local runs.
///
/// Mirrors the PostgreSQL implementation: creates are all-or-nothing,
/// reads hand out copies, updates of unknown ids are silently ignored.
#[derive(Clone, Default)]
pub struct InMemoryOrderRepository {
    state: Arc<RwLock<InMemoryState>>,
}

impl InMemoryOrderRepository {
    /// Creates a new empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Returns the number of stored item rows across all orders.
    pub async fn item_count(&self) -> usize {
        self.state
            .read()
            .await
            .orders
            .values()
            .map(Order::item_count)
            .sum()
    }

    /// Makes every subsequent `create` fail after the order row was staged.
    pub async fn set_fail_on_create(&self, fail: bool) {
        self.state.write().await.fail_on_create = fail;
    }

    /// Makes every operation fail as if the database were down.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.state.write().await.unavailable = unavailable;
    }

    /// Clears all orders.
    pub async fn clear(&self) {
        self.state.write().await.orders.clear();
    }
}

fn check_available(state: &InMemoryState) -> Result<()> {
    if state.unavailable {
        return Err(StoreError::Unavailable("in-memory store marked unavailable".to_string()));
    }
    Ok(())
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn create(&self, order: &Order) -> Result<()> {
        let mut state = self.state.write().await;
        check_available(&state)?;

        if state.orders.contains_key(order.id()) {
            return Err(StoreError::AlreadyExists(order.id().clone()));
        }

        // Stage the full aggregate first; nothing becomes visible on failure
        let staged = order.clone();
        if state.fail_on_create {
            return Err(StoreError::Unavailable(format!(
                "failed writing items of order {}",
                order.id()
            )));
        }

        state.orders.insert(staged.id().clone(), staged);
        Ok(())
    }

    async fn get_by_id(&self, id: &OrderId) -> Result<Order> {
        let state = self.state.read().await;
        check_available(&state)?;

        state
            .orders
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn get_by_state(&self, wanted: OrderState) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        check_available(&state)?;

        let mut orders: Vec<_> = state
            .orders
            .values()
            .filter(|o| o.state() == wanted)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(orders)
    }

    async fn update(&self, order: &Order) -> Result<()> {
        let mut state = self.state.write().await;
        check_available(&state)?;

        if let Some(stored) = state.orders.get_mut(order.id()) {
            // Only the state columns are persisted; items and created_at stay as stored
            *stored = Order::restore(
                stored.id().clone(),
                order.state(),
                order.state_updated_at(),
                stored.created_at(),
                order.updated_at(),
                stored.items().cloned().collect::<Vec<_>>(),
            );
        }
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        check_available(&*self.state.read().await)
    }
}
