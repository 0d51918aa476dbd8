//! Order production service.

use std::sync::Arc;

use common::{Clock, OrderId, SystemClock};
use domain::{Order, OrderState};
use order_store::{OrderRepository, StoreError};

use crate::contract::{
    CreateOrderProductionInput, GetOrderProductionByIdInput, GetOrderProductionByStateInput,
    UpdateOrderProductionInput,
};
use crate::{Result, ServiceError};

/// Use cases over the order repository.
///
/// Cheap to share: wrap it in an `Arc` and hand it to the consumer and the
/// HTTP handlers. Every call works on its own copy of the order.
pub struct OrderProductionService<R: OrderRepository> {
    repository: R,
    clock: Arc<dyn Clock>,
}

impl<R: OrderRepository> OrderProductionService<R> {
    /// Creates a service reading time from the system clock.
    pub fn new(repository: R) -> Self {
        Self::with_clock(repository, Arc::new(SystemClock))
    }

    /// Creates a service with an explicit time source.
    pub fn with_clock(repository: R, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Returns a reference to the underlying repository.
    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Registers a paid order for production.
    ///
    /// Fails with `AlreadyExists` when the id was seen before, which makes
    /// redelivered notifications harmless.
    #[tracing::instrument(skip(self, input), fields(order_id = %input.order_id, items = input.items.len()))]
    pub async fn create_order(&self, input: CreateOrderProductionInput) -> Result<Order> {
        let (order_id, items) = input.parse()?;

        match self.repository.get_by_id(&order_id).await {
            Ok(_) => return Err(ServiceError::AlreadyExists(order_id)),
            Err(StoreError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }

        let now = self.clock.now();
        let mut order = Order::new(order_id, now);
        for item in items {
            order.add_item(item, now)?;
        }

        self.repository.create(&order).await?;

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(order_id = %order.id(), items = order.item_count(), "Order received for production");

        Ok(order)
    }

    /// Loads one order with its items.
    #[tracing::instrument(skip(self))]
    pub async fn get_by_id(&self, input: GetOrderProductionByIdInput) -> Result<Order> {
        let order_id = input.parse()?;
        Ok(self.repository.get_by_id(&order_id).await?)
    }

    /// Lists every order currently in the requested state, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn get_by_state(&self, input: GetOrderProductionByStateInput) -> Result<Vec<Order>> {
        let state = input.parse()?;
        Ok(self.repository.get_by_state(state).await?)
    }

    /// Moves an order along the production flow.
    ///
    /// Publishing the change is left to the caller.
    #[tracing::instrument(skip(self))]
    pub async fn update_state(&self, input: UpdateOrderProductionInput) -> Result<Order> {
        let (order_id, target) = input.parse()?;
        self.transition(order_id, target).await
    }

    async fn transition(&self, order_id: OrderId, target: OrderState) -> Result<Order> {
        let mut order = self.repository.get_by_id(&order_id).await?;
        let previous = order.state();

        order.update_state(target, self.clock.now())?;
        self.repository.update(&order).await?;

        if previous != target {
            metrics::counter!("order_state_updates_total", "state" => target.as_str()).increment(1);
            tracing::info!(order_id = %order.id(), from = %previous, to = %target, "Order state updated");
        }

        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CreateOrderProductionItemInput;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use common::FixedClock;
    use order_store::InMemoryOrderRepository;
    use uuid::Uuid;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn service() -> (
        OrderProductionService<InMemoryOrderRepository>,
        InMemoryOrderRepository,
        FixedClock,
    ) {
        let repo = InMemoryOrderRepository::new();
        let clock = FixedClock::new(t0());
        let service = OrderProductionService::with_clock(repo.clone(), Arc::new(clock.clone()));
        (service, repo, clock)
    }

    fn item(name: &str, quantity: i64) -> CreateOrderProductionItemInput {
        CreateOrderProductionItemInput {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            quantity,
        }
    }

    fn create_input(order_id: &str, items: Vec<CreateOrderProductionItemInput>) -> CreateOrderProductionInput {
        CreateOrderProductionInput {
            order_id: order_id.to_string(),
            items,
        }
    }

    #[tokio::test]
    async fn create_persists_received_order_with_items() {
        let (service, repo, _) = service();
        let id = Uuid::new_v4().to_string();

        let order = service
            .create_order(create_input(&id, vec![item("Burger", 2), item("Fries", 1)]))
            .await
            .unwrap();

        assert_eq!(order.state(), OrderState::Received);
        assert_eq!(order.item_count(), 2);
        assert_eq!(order.created_at(), t0());
        assert_eq!(repo.order_count().await, 1);
        assert_eq!(repo.item_count().await, 2);
    }

    #[tokio::test]
    async fn create_twice_fails_and_keeps_one_order() {
        let (service, repo, _) = service();
        let id = Uuid::new_v4().to_string();
        let input = create_input(&id, vec![item("Burger", 1)]);

        service.create_order(input.clone()).await.unwrap();
        let result = service.create_order(input).await;

        assert!(matches!(result, Err(ServiceError::AlreadyExists(existing)) if existing.as_str() == id));
        assert_eq!(repo.order_count().await, 1);
        assert_eq!(repo.item_count().await, 1);
    }

    #[tokio::test]
    async fn create_with_repeated_item_id_writes_nothing() {
        let (service, repo, _) = service();
        let burger = item("Burger", 1);
        let again = CreateOrderProductionItemInput {
            name: "Burger again".to_string(),
            ..burger.clone()
        };

        let result = service
            .create_order(create_input(&Uuid::new_v4().to_string(), vec![burger, again]))
            .await;

        assert!(matches!(result, Err(ServiceError::DuplicateItem(_))));
        assert_eq!(repo.order_count().await, 0);
    }

    #[tokio::test]
    async fn create_rejects_invalid_input_before_touching_storage() {
        let (service, repo, _) = service();
        repo.set_unavailable(true).await;

        let result = service
            .create_order(create_input("O1", vec![item("Burger", 1)]))
            .await;

        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn create_accepts_empty_item_list() {
        let (service, repo, _) = service();

        let order = service
            .create_order(create_input(&Uuid::new_v4().to_string(), vec![]))
            .await
            .unwrap();

        assert!(!order.has_items());
        assert_eq!(repo.order_count().await, 1);
    }

    #[tokio::test]
    async fn failed_create_leaves_no_rows() {
        let (service, repo, _) = service();
        repo.set_fail_on_create(true).await;

        let result = service
            .create_order(create_input(&Uuid::new_v4().to_string(), vec![item("Burger", 1)]))
            .await;

        assert!(matches!(result, Err(ServiceError::Storage(_))));
        assert_eq!(repo.order_count().await, 0);
        assert_eq!(repo.item_count().await, 0);
    }

    #[tokio::test]
    async fn get_by_id_returns_not_found_for_unknown_order() {
        let (service, _, _) = service();
        let id = Uuid::new_v4().to_string();

        let result = service.get_by_id(GetOrderProductionByIdInput::new(id.as_str())).await;

        assert!(matches!(result, Err(ServiceError::NotFound(missing)) if missing.as_str() == id));
    }

    #[tokio::test]
    async fn get_by_state_on_empty_store_is_empty() {
        let (service, _, _) = service();

        let orders = service
            .get_by_state(GetOrderProductionByStateInput::new("Received"))
            .await
            .unwrap();

        assert!(orders.is_empty());
    }

    #[tokio::test]
    async fn get_by_state_rejects_unknown_name() {
        let (service, _, _) = service();

        let result = service
            .get_by_state(GetOrderProductionByStateInput::new("Cooking"))
            .await;

        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn lifecycle_follows_transition_graph() {
        let (service, _, clock) = service();
        let id = Uuid::new_v4().to_string();
        service
            .create_order(create_input(&id, vec![item("Burger", 1)]))
            .await
            .unwrap();

        clock.advance(Duration::minutes(1));
        let order = service
            .update_state(UpdateOrderProductionInput::new(id.as_str(), "Processing"))
            .await
            .unwrap();
        assert_eq!(order.state(), OrderState::Processing);
        assert_eq!(order.state_updated_at(), t0() + Duration::minutes(1));

        let skipped = service
            .update_state(UpdateOrderProductionInput::new(id.as_str(), "Delivered"))
            .await;
        assert!(matches!(
            skipped,
            Err(ServiceError::InvalidTransition {
                from: OrderState::Processing,
                to: OrderState::Delivered
            })
        ));

        service
            .update_state(UpdateOrderProductionInput::new(id.as_str(), "Completed"))
            .await
            .unwrap();
        let delivered = service
            .update_state(UpdateOrderProductionInput::new(id.as_str(), "Delivered"))
            .await
            .unwrap();
        assert!(delivered.is_completed());

        let stored = service
            .get_by_id(GetOrderProductionByIdInput::new(id.as_str()))
            .await
            .unwrap();
        assert_eq!(stored.state(), OrderState::Delivered);
        assert_eq!(stored.item_count(), 1);
    }

    #[tokio::test]
    async fn update_to_current_state_keeps_timestamps() {
        let (service, _, clock) = service();
        let id = Uuid::new_v4().to_string();
        service.create_order(create_input(&id, vec![])).await.unwrap();

        clock.advance(Duration::hours(1));
        let order = service
            .update_state(UpdateOrderProductionInput::new(id.as_str(), "Received"))
            .await
            .unwrap();

        assert_eq!(order.state_updated_at(), t0());
        assert_eq!(order.updated_at(), t0());
    }

    #[tokio::test]
    async fn update_of_unknown_order_is_not_found() {
        let (service, _, _) = service();

        let result = service
            .update_state(UpdateOrderProductionInput::new(
                Uuid::new_v4().to_string(),
                "Processing",
            ))
            .await;

        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn storage_outage_surfaces_as_storage_error() {
        let (service, repo, _) = service();
        repo.set_unavailable(true).await;

        let result = service
            .get_by_id(GetOrderProductionByIdInput::new(Uuid::new_v4().to_string()))
            .await;

        assert!(matches!(result, Err(ServiceError::Storage(_))));
        assert!(!result.unwrap_err().is_business());
    }
}
