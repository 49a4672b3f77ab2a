use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::envelope;
use crate::auth::AuthUser;
use crate::error::AppError;
use crate::services::OrderService;
use crate::validation::{OrderRequest, UpdateOrderStatus};
use crate::AppState;

/// Best-effort client address for the gateway payload: proxy headers first,
/// loopback otherwise.
fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|h| h.to_str().ok())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "127.0.0.1".to_string())
}

fn order_service(state: &AppState) -> OrderService {
    OrderService::new(state.db.clone(), state.gateway.clone())
}

pub async fn create_order(
    State(state): State<AppState>,
    caller: AuthUser,
    headers: HeaderMap,
    Json(payload): Json<OrderRequest>,
) -> Result<impl IntoResponse, AppError> {
    let checkout_url = order_service(&state)
        .create_order(&caller, payload, &client_ip(&headers))
        .await?;

    Ok(envelope(
        StatusCode::CREATED,
        "Order created successfully",
        json!({ "checkout_url": checkout_url }),
    ))
}

pub async fn get_my_orders(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let orders = order_service(&state).list_for_user(caller.id).await?;

    Ok(envelope(
        StatusCode::OK,
        "Orders retrieved successfully",
        serde_json::to_value(orders).map_err(|e| AppError::Internal(e.to_string()))?,
    ))
}

pub async fn get_all_orders(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    caller.require_admin()?;

    let orders = order_service(&state).list_all().await?;

    Ok(envelope(
        StatusCode::OK,
        "Orders retrieved successfully",
        serde_json::to_value(orders).map_err(|e| AppError::Internal(e.to_string()))?,
    ))
}

pub async fn get_single_order(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let (order, items) = order_service(&state).get_for_user(caller.id, id).await?;

    let mut data = serde_json::to_value(order).map_err(|e| AppError::Internal(e.to_string()))?;
    data["products"] =
        serde_json::to_value(items).map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(envelope(StatusCode::OK, "Order retrieved successfully", data))
}

pub async fn update_order_status(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatus>,
) -> Result<impl IntoResponse, AppError> {
    caller.require_admin()?;

    let order = order_service(&state).update_status(id, payload).await?;

    Ok(envelope(
        StatusCode::OK,
        "Order status updated successfully",
        serde_json::to_value(order).map_err(|e| AppError::Internal(e.to_string()))?,
    ))
}

#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    pub order_id: String,
}

pub async fn verify_payment(
    State(state): State<AppState>,
    _caller: AuthUser,
    Query(params): Query<VerifyParams>,
) -> Result<impl IntoResponse, AppError> {
    let record = order_service(&state).verify_payment(&params.order_id).await?;

    Ok(envelope(
        StatusCode::OK,
        "Order verified successfully",
        serde_json::to_value(record).map_err(|e| AppError::Internal(e.to_string()))?,
    ))
}

pub async fn calculate_revenue(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let total_revenue = order_service(&state).calculate_revenue().await?;

    Ok(envelope(
        StatusCode::OK,
        "Revenue calculated successfully",
        json!({ "totalRevenue": total_revenue.to_string() }),
    ))
}
