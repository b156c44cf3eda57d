//! Catchment dashboard service library
//!
//! Serves the dashboard layout, applies control events to the update graph
//! and exposes the resulting view state over HTTP.

pub mod config;
pub mod handlers;
pub mod layout;
pub mod state;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Extension, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

/// Build the application router.
pub fn router(state: Arc<AppState>, prometheus: PrometheusHandle) -> Router {
    Router::new()
        .route("/", get(handlers::index::index_handler))
        // Dashboard API
        .route("/api/layout", get(handlers::layout::layout_handler))
        .route("/api/view", get(handlers::view::view_handler))
        .route("/api/events", post(handlers::events::events_handler))
        // Health and metrics
        .route("/health", get(handlers::health::health_handler))
        .route("/ready", get(handlers::health::ready_handler))
        .route("/metrics", get(handlers::health::metrics_handler))
        // Middleware
        .layer(Extension(state))
        .layer(Extension(prometheus))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}
