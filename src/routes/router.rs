use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::collector::MinipoolCollector;
use crate::handlers::{active_minipools, health, minipool_details, minipool_status};

pub fn create_router(collector: Arc<MinipoolCollector>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/minipools/active", get(active_minipools))
        .route("/minipools/{address}/details", get(minipool_details))
        .route("/minipools/{address}/status", get(minipool_status))
        .layer(TraceLayer::new_for_http())
        .with_state(collector)
}
