//! Order production endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use chrono::{DateTime, Utc};
use domain::Order;
use messaging::{TopicPublisher, UpdateOrderPublisher};
use order_store::OrderRepository;
use production::{
    GetOrderProductionByIdInput, GetOrderProductionByStateInput, OrderProductionService,
    UpdateOrderProductionInput,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<R: OrderRepository, T: TopicPublisher> {
    pub service: Arc<OrderProductionService<R>>,
    pub publisher: Arc<UpdateOrderPublisher<T>>,
}

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct StateQuery {
    #[serde(default)]
    pub state: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStateRequest {
    pub state: String,
}

// -- Response types --

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderResponse {
    pub id: String,
    /// Stored state code.
    pub state: i16,
    pub state_title: String,
    pub state_updated_at: DateTime<Utc>,
    pub items: Vec<ItemResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ItemResponse {
    pub id: String,
    pub name: String,
    pub quantity: u32,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id().to_string(),
            state: order.state().code(),
            state_title: order.state_title().to_string(),
            state_updated_at: order.state_updated_at(),
            items: order
                .items()
                .map(|item| ItemResponse {
                    id: item.id.to_string(),
                    name: item.name.clone(),
                    quantity: item.quantity,
                })
                .collect(),
            created_at: order.created_at(),
            updated_at: order.updated_at(),
        }
    }
}

// -- Handlers --

/// GET /api/{api_version}/production/{id}: load one order with its items.
#[tracing::instrument(skip(state))]
pub async fn get<R, T>(
    State(state): State<Arc<AppState<R, T>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError>
where
    R: OrderRepository + 'static,
    T: TopicPublisher + 'static,
{
    let order = state
        .service
        .get_by_id(GetOrderProductionByIdInput::new(id))
        .await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// GET /api/{api_version}/production?state=Processing: list orders in a state.
#[tracing::instrument(skip(state))]
pub async fn list<R, T>(
    State(state): State<Arc<AppState<R, T>>>,
    Query(query): Query<StateQuery>,
) -> Result<Json<Vec<OrderResponse>>, ApiError>
where
    R: OrderRepository + 'static,
    T: TopicPublisher + 'static,
{
    let orders = state
        .service
        .get_by_state(GetOrderProductionByStateInput::new(query.state))
        .await?;
    Ok(Json(orders.iter().map(OrderResponse::from).collect()))
}

/// PATCH /api/{api_version}/production/{id}: move an order to a new state.
///
/// The change is announced on the update-order topic; a failed publish is
/// logged and does not fail the request.
#[tracing::instrument(skip(state, body))]
pub async fn update<R, T>(
    State(state): State<Arc<AppState<R, T>>>,
    Path(id): Path<String>,
    body: Result<Json<UpdateStateRequest>, JsonRejection>,
) -> Result<Json<OrderResponse>, ApiError>
where
    R: OrderRepository + 'static,
    T: TopicPublisher + 'static,
{
    let Json(request) = body.map_err(|e| ApiError::InvalidBody(e.body_text()))?;

    let order = state
        .service
        .update_state(UpdateOrderProductionInput::new(id, request.state))
        .await?;

    if let Err(e) = state.publisher.publish_state_change(&order).await {
        tracing::error!(order_id = %order.id(), error = %e, "Failed to publish order update");
    }

    Ok(Json(OrderResponse::from(&order)))
}
