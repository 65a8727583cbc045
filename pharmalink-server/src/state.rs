//! Application state for pharmalink-server

use sqlx::PgPool;
use std::sync::Arc;

use crate::config::Config;
use crate::notify::{ExpoGateway, Notifier};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool
    pub pool: PgPool,
    /// JWT secret for verifying bearer tokens from the auth service
    pub jwt_secret: String,
    /// Best-effort push notification dispatcher
    pub notifier: Notifier,
}

impl AppState {
    /// Create a new AppState
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = PgPool::connect(&config.database_url).await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        let gateway = ExpoGateway::new(config.expo_push_url.clone());

        Ok(Self {
            pool,
            jwt_secret: config.jwt_secret.clone(),
            notifier: Notifier::new(Arc::new(gateway)),
        })
    }
}
