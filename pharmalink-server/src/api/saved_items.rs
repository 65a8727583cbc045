//! Saved item endpoints

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
        .route("/", get(list_saved_items).post(save_item))
        .route("/{id}", axum::routing::delete(unsave_item))
}

async fn list_saved_items(
    State(state): State<AppState>,
    Extension(actor): Extension<ActingUser>,
) -> ApiResult<Value> {
    let items = db::saved_items::list(&state.pool, actor.id).await?;
    Ok(Json(ApiResponse::with_count(
        items.len() as i64,
        json!({ "items": items }),
    )))
}

#[derive(Debug, Deserialize)]
struct SaveItemRequest {
    item: i64,
}

async fn save_item(
    State(state): State<AppState>,
    Extension(actor): Extension<ActingUser>,
    Json(request): Json<SaveItemRequest>,
) -> ApiResult<()> {
    db::items::find_by_id(&state.pool, request.item)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ItemNotFound))?;

    db::saved_items::add(&state.pool, actor.id, request.item).await?;
    Ok(Json(ApiResponse::ok()))
}

async fn unsave_item(
    State(state): State<AppState>,
    Extension(actor): Extension<ActingUser>,
    Path(item_id): Path<i64>,
) -> ApiResult<()> {
    if !db::saved_items::remove(&state.pool, actor.id, item_id).await? {
        return Err(AppError::not_found("Saved item"));
    }
    Ok(Json(ApiResponse::ok()))
}
