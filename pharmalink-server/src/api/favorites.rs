//! Favorite counterparty endpoints

use axum::extract::{Extension, Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use shared::error::{ApiResponse, AppError, ErrorCode};

use super::ApiResult;
use crate::auth::ActingUser;
use crate::db;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_favorites).post(add_favorite))
        .route("/{id}", axum::routing::delete(remove_favorite))
}

async fn list_favorites(
    State(state): State<AppState>,
    Extension(actor): Extension<ActingUser>,
) -> ApiResult<Value> {
    let users = db::favorites::list(&state.pool, actor.id).await?;
    Ok(Json(ApiResponse::with_count(
        users.len() as i64,
        json!({ "users": users }),
    )))
}

#[derive(Debug, Deserialize)]
struct AddFavoriteRequest {
    user: i64,
}

async fn add_favorite(
    State(state): State<AppState>,
    Extension(actor): Extension<ActingUser>,
    Json(request): Json<AddFavoriteRequest>,
) -> ApiResult<()> {
    if request.user == actor.id {
        return Err(AppError::validation("cannot favorite yourself"));
    }
    db::users::find_by_id(&state.pool, request.user)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;

    db::favorites::add(&state.pool, actor.id, request.user).await?;
    Ok(Json(ApiResponse::ok()))
}

async fn remove_favorite(
    State(state): State<AppState>,
    Extension(actor): Extension<ActingUser>,
    Path(user_id): Path<i64>,
) -> ApiResult<()> {
    if !db::favorites::remove(&state.pool, actor.id, user_id).await? {
        return Err(AppError::not_found("Favorite"));
    }
    Ok(Json(ApiResponse::ok()))
}
