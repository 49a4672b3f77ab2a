use sqlx::migrate::Migrator;
use std::net::SocketAddr;
use std::path::Path;
use tracing_subscriber::prelude::*;

use wheelhouse_core::config::Config;
use wheelhouse_core::payment::PaymentClient;
use wheelhouse_core::{create_app, db, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Setup logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Database pool
    let pool = db::create_pool(&config).await?;

    // Run migrations
    let migrator = Migrator::new(Path::new("./migrations")).await?;
    migrator.run(&pool).await?;
    tracing::info!("Database migrations completed");

    // Initialize payment gateway client
    let gateway = PaymentClient::new(
        config.gateway_url.clone(),
        config.gateway_username.clone(),
        config.gateway_password.clone(),
        config.gateway_return_url.clone(),
    );
    tracing::info!("Payment gateway client initialized with URL: {}", config.gateway_url);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let app = create_app(AppState {
        db: pool,
        gateway,
        config,
    });

    tracing::info!("listening on {}", addr);
    axum::Server::bind(&addr).serve(app.into_make_service()).await?;

    Ok(())
}
