use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::collections::HashMap;
use uuid::Uuid;

use super::{envelope, envelope_with_meta};
use crate::auth::AuthUser;
use crate::error::AppError;
use crate::services::ProductService;
use crate::validation::{NewProduct, UpdateProduct};
use crate::AppState;

pub async fn create_product(
    State(state): State<AppState>,
    caller: AuthUser,
    Json(payload): Json<NewProduct>,
) -> Result<impl IntoResponse, AppError> {
    caller.require_admin()?;

    let product = ProductService::new(state.db.clone())
        .create_one(&caller, payload)
        .await?;

    Ok(envelope(
        StatusCode::CREATED,
        "Product created successfully",
        serde_json::to_value(product).map_err(|e| AppError::Internal(e.to_string()))?,
    ))
}

pub async fn get_all_products(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let (meta, products) = ProductService::new(state.db.clone()).fetch_all(query).await?;

    Ok(envelope_with_meta(
        StatusCode::OK,
        "Products retrieved successfully",
        serde_json::Value::Array(products),
        serde_json::to_value(meta).map_err(|e| AppError::Internal(e.to_string()))?,
    ))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let product = ProductService::new(state.db.clone()).fetch_one(id).await?;

    Ok(envelope(
        StatusCode::OK,
        "Product retrieved successfully",
        serde_json::to_value(product).map_err(|e| AppError::Internal(e.to_string()))?,
    ))
}

pub async fn update_product(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProduct>,
) -> Result<impl IntoResponse, AppError> {
    let product = ProductService::new(state.db.clone())
        .update_one(&caller, id, payload)
        .await?;

    Ok(envelope(
        StatusCode::OK,
        "Product updated successfully",
        serde_json::to_value(product).map_err(|e| AppError::Internal(e.to_string()))?,
    ))
}

pub async fn delete_product(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    ProductService::new(state.db.clone())
        .delete_one(&caller, id)
        .await?;

    Ok(envelope(
        StatusCode::OK,
        "Product deleted successfully",
        json!({}),
    ))
}
