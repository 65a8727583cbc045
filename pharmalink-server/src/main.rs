//! pharmalink-server — pharmaceutical ordering backend
//!
//! Long-running service that:
//! - Manages the catalog (items, per-warehouse stocking/offers/points)
//! - Manages identities (pharmacies, warehouses, companies, admins)
//! - Tracks orders through their status lifecycle
//! - Pushes order-status notifications to mobile clients (Expo)

mod api;
mod auth;
mod config;
mod db;
mod error;
mod lifecycle;
mod notify;
mod state;

use config::Config;
use state::AppState;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pharmalink_server=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;

    tracing::info!("Starting pharmalink-server (env: {})", config.environment);

    // Initialize application state
    let state = AppState::new(&config).await?;

    // Build router
    let app = api::create_router(state);

    // Start HTTP server
    let http_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&http_addr).await?;
    tracing::info!("pharmalink-server listening on {http_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
