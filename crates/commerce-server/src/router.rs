use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use commerce_dispatch::Dispatcher;
use commerce_fabric::EventBus;

use crate::handler;

/// Shared state behind every route.
#[derive(Clone)]
pub struct AppState {
    pub bus: Arc<EventBus>,
    pub dispatcher: Dispatcher,
    pub service_version: String,
}

/// Build the axum router with all node endpoints.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route("/v1/info", get(handler::info_handler))
        .route("/v1/dispatch/stats", get(handler::stats_handler))
        .route("/v1/events", post(handler::publish_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
