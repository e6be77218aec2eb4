//! Router construction for the Safiri server.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{
    routing::{get, put},
    Extension, Json, Router,
};
use safiri_core::ports::OrderStore;
use safiri_core::UssdService;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;

/// Build the full axum router with all routes and middleware.
pub fn build_router(service: Arc<UssdService>, orders: Arc<dyn OrderStore>) -> Router {
    // Gateway callback, reachable at both paths
    let ussd = Router::new()
        .route(
            "/",
            get(handlers::ussd::callback_get).post(handlers::ussd::callback_post),
        )
        .route(
            "/ussd",
            get(handlers::ussd::callback_get).post(handlers::ussd::callback_post),
        );

    let admin = Router::new()
        .route("/api/orders", get(handlers::orders::list_orders))
        .route(
            "/api/orders/:tracking_number",
            get(handlers::orders::get_order),
        )
        .route(
            "/api/orders/:tracking_number/status",
            put(handlers::orders::update_status),
        );

    Router::new()
        .route("/health", get(handlers::health::health))
        .merge(ussd)
        .merge(admin)
        .fallback(not_found)
        .layer(Extension(service))
        .layer(Extension(orders))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": "Endpoint not found" })),
    )
}
