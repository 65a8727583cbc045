//! HTTP API
//!
//! Route namespaces, one module per aggregate. Everything under `/api`
//! requires a bearer JWT; `/health` is open.

pub mod baskets;
pub mod favorites;
pub mod health;
pub mod items;
pub mod orders;
pub mod saved_items;
pub mod users;

use axum::routing::get;
use axum::{Json, Router, middleware};
use shared::error::{ApiResponse, AppError};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth;
use crate::state::AppState;

/// Handler result: envelope on success, `{status:"fail"}` body via
/// `AppError::into_response` on failure.
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, AppError>;

pub(crate) fn default_page() -> i64 {
    1
}

pub(crate) fn default_limit() -> i64 {
    20
}

pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .nest("/orders", orders::router())
        .nest("/items", items::router())
        .nest("/users", users::router())
        .nest("/baskets", baskets::router())
        .nest("/saved-items", saved_items::router())
        .nest("/favorites", favorites::router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    Router::new()
        .route("/health", get(health::health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::create_token;
    use crate::notify::Notifier;
    use crate::notify::tests::MockGateway;
    use axum::body::Body;
    use http::{Request, StatusCode};
    use shared::models::Role;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    const TEST_SECRET: &str = "test-secret";

    /// Router over a lazy pool: requests that never reach the database can
    /// be exercised without one.
    fn test_router() -> Router {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/pharmalink_test")
            .unwrap();
        let (gateway, _rx) = MockGateway::channel();
        let state = AppState {
            pool,
            jwt_secret: TEST_SECRET.to_string(),
            notifier: Notifier::new(gateway),
        };
        create_router(state)
    }

    #[tokio::test]
    async fn health_is_open() {
        let response = test_router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn api_requires_bearer_token() {
        let response = test_router()
            .oneshot(Request::get("/api/orders").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let response = test_router()
            .oneshot(
                Request::get("/api/orders")
                    .header("Authorization", "Bearer not-a-jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn role_gate_rejects_before_any_query() {
        let token = create_token(1, Role::Normal, TEST_SECRET).unwrap();
        let response = test_router()
            .oneshot(
                Request::get("/api/orders/unread-count")
                    .header("Authorization", format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
