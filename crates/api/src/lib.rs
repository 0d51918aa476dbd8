//! HTTP surface of the order production service.
//!
//! Exposes order lookups and state updates over REST, plus health and
//! Prometheus endpoints. The binary in `main.rs` wires the repository, the
//! queue consumer and the update-order publisher together.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use messaging::TopicPublisher;
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::OrderRepository;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use routes::production::AppState;

/// Creates the Axum application router with all routes and shared state.
///
/// Production routes live under `/api/{api_version}/production`.
pub fn create_app<R, T>(
    state: Arc<AppState<R, T>>,
    metrics_handle: PrometheusHandle,
    api_version: &str,
) -> Router
where
    R: OrderRepository + 'static,
    T: TopicPublisher + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    let production = format!("/api/{api_version}/production");

    Router::new()
        .route("/health", get(routes::health::check::<R, T>))
        .route(&production, get(routes::production::list::<R, T>))
        .route(
            &format!("{production}/{{id}}"),
            get(routes::production::get::<R, T>).patch(routes::production::update::<R, T>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
