//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use messaging::TopicPublisher;
use order_store::OrderRepository;
use serde::Serialize;

use super::production::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// GET /health: reports whether the order store answers.
pub async fn check<R, T>(State(state): State<Arc<AppState<R, T>>>) -> (StatusCode, Json<HealthResponse>)
where
    R: OrderRepository + 'static,
    T: TopicPublisher + 'static,
{
    match state.service.repository().ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy",
                error: None,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unhealthy",
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}
