//! Admin order handlers.
//!
//! GET /api/orders                            — newest first (?limit=, default 100, max 500)
//! GET /api/orders/:tracking_number           — one order
//! PUT /api/orders/:tracking_number/status    — replace the status text

use std::sync::Arc;

use axum::extract::{Path, Query};
use axum::{Extension, Json};
use safiri_core::ports::OrderStore;
use safiri_core::types::Order;
use safiri_core::ussd::path::normalize_tracking_code;
use safiri_core::SafiriError;
use serde::Deserialize;

use crate::error::AppError;

pub const DEFAULT_LIST_LIMIT: u32 = 100;
pub const MAX_LIST_LIMIT: u32 = 500;

#[derive(Debug, Default, Deserialize)]
pub struct ListOrdersQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

pub async fn list_orders(
    Extension(orders): Extension<Arc<dyn OrderStore>>,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<Vec<Order>>, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT).min(MAX_LIST_LIMIT);
    Ok(Json(orders.list_orders(limit).await?))
}

pub async fn get_order(
    Extension(orders): Extension<Arc<dyn OrderStore>>,
    Path(tracking_number): Path<String>,
) -> Result<Json<Order>, AppError> {
    let code = normalize_tracking_code(&tracking_number);
    let order = orders
        .find_by_tracking_number(&code)
        .await?
        .ok_or_else(|| SafiriError::NotFound(format!("order {code}")))?;
    Ok(Json(order))
}

pub async fn update_status(
    Extension(orders): Extension<Arc<dyn OrderStore>>,
    Path(tracking_number): Path<String>,
    Json(body): Json<StatusUpdate>,
) -> Result<Json<Order>, AppError> {
    let status = body.status.trim();
    if status.is_empty() {
        return Err(SafiriError::InvalidInput("status must not be empty".into()).into());
    }
    let code = normalize_tracking_code(&tracking_number);
    let order = orders.update_status(&code, status).await?;
    tracing::info!(tracking_number = %code, status, "order status updated");
    Ok(Json(order))
}
