pub mod orders;
pub mod products;
pub mod users;

use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

/// Standard success envelope shared by every handler.
pub(crate) fn envelope(
    status: StatusCode,
    message: &str,
    data: Value,
) -> (StatusCode, Json<Value>) {
    (
        status,
        Json(json!({
            "success": true,
            "statusCode": status.as_u16(),
            "message": message,
            "data": data,
        })),
    )
}

pub(crate) fn envelope_with_meta(
    status: StatusCode,
    message: &str,
    data: Value,
    meta: Value,
) -> (StatusCode, Json<Value>) {
    (
        status,
        Json(json!({
            "success": true,
            "statusCode": status.as_u16(),
            "message": message,
            "meta": meta,
            "data": data,
        })),
    )
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    // Check database connectivity with SELECT 1 query
    let db_status = match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => "connected",
        Err(_) => "disconnected",
    };

    let status_code = if db_status == "connected" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(json!({
            "status": if db_status == "connected" { "healthy" } else { "unhealthy" },
            "version": env!("CARGO_PKG_VERSION"),
            "db": db_status,
        })),
    )
}
