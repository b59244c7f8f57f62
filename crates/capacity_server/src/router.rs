//! Router construction for the capacity server.

use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Extension, Router,
};
use capacity_core::service::CapacityServicePort;
use tower_http::trace::TraceLayer;

use crate::handlers;

/// Build the full axum router with all routes and middleware.
pub fn build_router(service: Arc<dyn CapacityServicePort>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/capacity", post(handlers::capacity::create_capacity))
        .route("/capacity/all", get(handlers::capacity::list_capabilities))
        .route(
            "/capacity/assign",
            post(handlers::bootcamp::assign_capabilities),
        )
        .route(
            "/capacity/bootcamps_ids",
            get(handlers::bootcamp::capabilities_by_bootcamps_ids),
        )
        .route(
            "/capacity/bootcamps",
            get(handlers::bootcamp::bootcamps_sorted_by_capabilities),
        )
        .route(
            "/capacity/bootcamp",
            delete(handlers::bootcamp::delete_capabilities_without_id),
        )
        .route(
            "/capacity/bootcamp/:id",
            delete(handlers::bootcamp::delete_capabilities_by_bootcamp),
        )
        .layer(Extension(service))
        .layer(TraceLayer::new_for_http())
}
