//! JWT authentication for the API
//!
//! Token issuance lives in the external auth service; this module only
//! verifies bearer tokens and attaches the acting user to the request.
//! Handlers receive the actor as an explicit value, never from ambient
//! request state.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared::error::AppError;
use shared::models::Role;

use crate::state::AppState;

/// JWT claims issued by the auth service
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: i64,
    /// User role (lowercase wire form)
    pub role: String,
    /// Expiration (Unix timestamp seconds)
    pub exp: usize,
    /// Issued at (Unix timestamp seconds)
    pub iat: usize,
}

/// Authenticated actor extracted from the JWT.
#[derive(Debug, Clone, Copy)]
pub struct ActingUser {
    pub id: i64,
    pub role: Role,
}

impl ActingUser {
    /// Role gate for handlers. Mirrors the route-level role restrictions of
    /// the public API.
    pub fn require(&self, allowed: &[Role]) -> Result<(), AppError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(AppError::permission_denied(
                "you do not have permission to perform this action",
            ))
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

const JWT_EXPIRY_HOURS: i64 = 24;

/// Create a JWT for a user. Used by tests and operational tooling; the
/// production issuer is the auth service.
pub fn create_token(
    user_id: i64,
    role: Role,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now();
    let claims = Claims {
        sub: user_id,
        role: role.as_str().to_string(),
        exp: (now + chrono::Duration::hours(JWT_EXPIRY_HOURS)).timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Middleware that extracts and verifies the bearer JWT from the
/// Authorization header, attaching [`ActingUser`] as a request extension.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::not_authenticated().into_response())?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::invalid_token("Invalid Authorization format").into_response())?;

    let validation = Validation::default();
    let token_data = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        tracing::debug!("JWT validation failed: {e}");
        AppError::invalid_token("Invalid or expired token").into_response()
    })?;

    let role = Role::parse(&token_data.claims.role)
        .ok_or_else(|| AppError::invalid_token("Unknown role in token").into_response())?;

    let actor = ActingUser {
        id: token_data.claims.sub,
        role,
    };

    request.extensions_mut().insert(actor);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trips_claims() {
        let secret = "test-secret";
        let token = create_token(42, Role::Warehouse, secret).unwrap();

        let data = jsonwebtoken::decode::<Claims>(
            &token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )
        .unwrap();

        assert_eq!(data.claims.sub, 42);
        assert_eq!(data.claims.role, "warehouse");
    }

    #[test]
    fn require_gates_on_role() {
        let actor = ActingUser {
            id: 1,
            role: Role::Pharmacy,
        };
        assert!(actor.require(&[Role::Pharmacy, Role::Admin]).is_ok());
        assert!(actor.require(&[Role::Warehouse]).is_err());
        assert!(!actor.is_admin());
    }
}
