use async_trait::async_trait;
use common::OrderId;
use domain::{Order, OrderState};

use crate::Result;

/// Persistence contract for order aggregates.
///
/// An order and its items form one consistency boundary. Implementations are
/// shared between the message consumer and the request path, so they must be
/// safe to call concurrently (Send + Sync).
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persists the order row and every item row atomically.
    ///
    /// Either all rows are written or none are.
    async fn create(&self, order: &Order) -> Result<()>;

    /// Loads an order with its items.
    ///
    /// Returns `NotFound` if no order row matches.
    async fn get_by_id(&self, id: &OrderId) -> Result<Order>;

    /// Loads every order in `state`, newest first, items included.
    async fn get_by_state(&self, state: OrderState) -> Result<Vec<Order>>;

    /// Persists the state columns and `updated_at` of an existing order.
    ///
    /// An unknown id affects zero rows and is not an error.
    async fn update(&self, order: &Order) -> Result<()>;

    /// Checks that the store can serve requests.
    async fn ping(&self) -> Result<()>;
}
