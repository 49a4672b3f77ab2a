pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod payment;
pub mod services;
pub mod validation;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::config::Config;
use crate::payment::PaymentClient;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub gateway: PaymentClient,
    pub config: Config,
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/api/products",
            post(handlers::products::create_product).get(handlers::products::get_all_products),
        )
        .route(
            "/api/products/:id",
            get(handlers::products::get_product)
                .put(handlers::products::update_product)
                .delete(handlers::products::delete_product),
        )
        .route(
            "/api/orders",
            post(handlers::orders::create_order).get(handlers::orders::get_my_orders),
        )
        .route("/api/orders/all-orders", get(handlers::orders::get_all_orders))
        .route("/api/orders/revenue", get(handlers::orders::calculate_revenue))
        .route("/api/orders/verify", post(handlers::orders::verify_payment))
        .route(
            "/api/orders/:id",
            get(handlers::orders::get_single_order).patch(handlers::orders::update_order_status),
        )
        .route("/api/users", get(handlers::users::list_users))
        .route("/api/users/me", get(handlers::users::get_me))
        .route(
            "/api/users/:id",
            get(handlers::users::get_single_user).put(handlers::users::change_user_status),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}
