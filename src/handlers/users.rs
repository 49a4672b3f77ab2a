use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use super::envelope;
use crate::auth::AuthUser;
use crate::error::AppError;
use crate::services::UserService;
use crate::validation::ChangeUserStatus;
use crate::AppState;

pub async fn list_users(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    caller.require_admin()?;

    let users = UserService::new(state.db.clone()).list_users().await?;

    Ok(envelope(
        StatusCode::OK,
        "Users retrieved successfully",
        serde_json::to_value(users).map_err(|e| AppError::Internal(e.to_string()))?,
    ))
}

pub async fn get_me(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let user = UserService::new(state.db.clone()).get_me(caller.id).await?;

    Ok(envelope(
        StatusCode::OK,
        "Profile retrieved successfully",
        serde_json::to_value(user).map_err(|e| AppError::Internal(e.to_string()))?,
    ))
}

pub async fn get_single_user(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    caller.require_admin()?;

    let user = UserService::new(state.db.clone()).get_one(id).await?;

    Ok(envelope(
        StatusCode::OK,
        "User retrieved successfully",
        serde_json::to_value(user).map_err(|e| AppError::Internal(e.to_string()))?,
    ))
}

pub async fn change_user_status(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChangeUserStatus>,
) -> Result<impl IntoResponse, AppError> {
    caller.require_admin()?;

    let user = UserService::new(state.db.clone())
        .change_status(id, payload)
        .await?;

    Ok(envelope(
        StatusCode::OK,
        "User status updated successfully",
        serde_json::to_value(user).map_err(|e| AppError::Internal(e.to_string()))?,
    ))
}
