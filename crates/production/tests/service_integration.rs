//! Service behavior under concurrent callers.

use std::sync::Arc;

use domain::OrderState;
use order_store::InMemoryOrderRepository;
use production::{
    CreateOrderProductionInput, CreateOrderProductionItemInput, GetOrderProductionByStateInput,
    OrderProductionService, ServiceError, UpdateOrderProductionInput,
};
use uuid::Uuid;

fn input(order_id: &str) -> CreateOrderProductionInput {
    CreateOrderProductionInput {
        order_id: order_id.to_string(),
        items: vec![CreateOrderProductionItemInput {
            id: Uuid::new_v4().to_string(),
            name: "Burger".to_string(),
            quantity: 1,
        }],
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_of_same_order_store_it_once() {
    let repo = InMemoryOrderRepository::new();
    let service = Arc::new(OrderProductionService::new(repo.clone()));
    let order_id = Uuid::new_v4().to_string();
    let payload = input(&order_id);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let service = Arc::clone(&service);
        let payload = payload.clone();
        handles.push(tokio::spawn(async move { service.create_order(payload).await }));
    }

    let mut created = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(ServiceError::AlreadyExists(_)) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(repo.order_count().await, 1);
}

#[tokio::test]
async fn orders_move_between_state_listings() {
    let service = OrderProductionService::new(InMemoryOrderRepository::new());
    let first = Uuid::new_v4().to_string();
    let second = Uuid::new_v4().to_string();
    service.create_order(input(&first)).await.unwrap();
    service.create_order(input(&second)).await.unwrap();

    service
        .update_state(UpdateOrderProductionInput::new(first.as_str(), "Processing"))
        .await
        .unwrap();

    let received = service
        .get_by_state(GetOrderProductionByStateInput::new("Received"))
        .await
        .unwrap();
    let processing = service
        .get_by_state(GetOrderProductionByStateInput::new("Processing"))
        .await
        .unwrap();

    assert_eq!(received.len(), 1);
    assert_eq!(received[0].id().as_str(), second);
    assert_eq!(processing.len(), 1);
    assert_eq!(processing[0].state(), OrderState::Processing);
    assert_eq!(processing[0].item_count(), 1);
}

#[tokio::test]
async fn cancelled_order_cannot_resume() {
    let service = OrderProductionService::new(InMemoryOrderRepository::new());
    let id = Uuid::new_v4().to_string();
    service.create_order(input(&id)).await.unwrap();

    service
        .update_state(UpdateOrderProductionInput::new(id.as_str(), "Cancelled"))
        .await
        .unwrap();
    let result = service
        .update_state(UpdateOrderProductionInput::new(id.as_str(), "Processing"))
        .await;

    assert!(matches!(
        result,
        Err(ServiceError::InvalidTransition {
            from: OrderState::Cancelled,
            to: OrderState::Processing
        })
    ));
}
